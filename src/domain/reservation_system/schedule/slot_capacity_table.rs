/// Cumulative number of persons committed to each hour of the operating window.
///
/// Counters only ever grow during a day: capacity spent on an hour is not
/// returned when the families leave, reservations are not cancellable.
#[derive(Debug, Clone)]
pub struct SlotCapacityTable {
    min_hour: i64,
    max_hour: i64,

    /// The maximum number of persons any single hour can hold.
    /// This value remains constant.
    capacity: i64,

    /// `load[h - min_hour]` persons committed to hour `h`.
    load: Vec<i64>,
}

impl SlotCapacityTable {
    pub fn new(min_hour: i64, max_hour: i64, capacity: i64) -> Self {
        let slots = (max_hour - min_hour + 1).max(0) as usize;
        SlotCapacityTable { min_hour, max_hour, capacity, load: vec![0; slots] }
    }

    pub fn capacity(&self) -> i64 {
        self.capacity
    }

    fn index(&self, hour: i64) -> Option<usize> {
        if hour < self.min_hour || hour > self.max_hour {
            return None;
        }
        Some((hour - self.min_hour) as usize)
    }

    /// Persons committed to `hour`, `None` outside the operating window.
    pub fn load(&self, hour: i64) -> Option<i64> {
        self.index(hour).map(|i| self.load[i])
    }

    /// Checks whether `persons` more fit into `hour`.
    ///
    /// Hours outside the operating window never have room.
    pub fn has_room(&self, hour: i64, persons: i64) -> bool {
        match self.load(hour) {
            Some(load) => load.checked_add(persons).is_some_and(|total| total <= self.capacity),
            None => false,
        }
    }

    /// Adds `persons` to `hour`.
    ///
    /// # Returns
    /// `true` if the load was increased;
    /// `false` if the hour is outside the window or the load would exceed the capacity.
    pub fn add_load(&mut self, hour: i64, persons: i64) -> bool {
        let Some(index) = self.index(hour) else {
            log::error!("Attempted to add load to hour {} outside the operating window {}-{}.", hour, self.min_hour, self.max_hour);
            return false;
        };

        match self.load[index].checked_add(persons) {
            Some(total) if persons >= 0 && total <= self.capacity => {
                self.load[index] = total;
                true
            }
            total => {
                log::error!(
                    "Load of {} persons rejected for hour {}. Current load: {} Load with request: {:?} Capacity: {}",
                    persons,
                    hour,
                    self.load[index],
                    total,
                    self.capacity
                );
                false
            }
        }
    }

    /// `(hour, load)` for every hour of the operating window.
    pub fn hours(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        self.load.iter().enumerate().map(|(i, load)| (self.min_hour + i as i64, *load))
    }
}
