use std::fmt;

use colored::Colorize;
use serde::Serialize;

use crate::domain::reservation_system::agent_registry::agent_registry::AgentRegistry;
use crate::domain::reservation_system::config::ScheduleConfig;
use crate::domain::reservation_system::schedule::schedule_state::SharedSchedule;
use crate::domain::reservation_system::utils::statistics::{RequestStatistics, StatisticsSnapshot};
use crate::domain::simulator::virtual_clock::HourStatus;

fn percentage(persons: i64, capacity: i64) -> i64 {
    if capacity <= 0 { 0 } else { (i128::from(persons) * 100 / i128::from(capacity)) as i64 }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HourOccupancy {
    pub hour: i64,
    pub persons: i64,
    pub percentage: i64,
}

/// Summary of a finished simulated day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayReport {
    pub capacity: i64,
    /// Hours with the highest occupancy; empty if nobody came.
    pub peak_hours: Vec<HourOccupancy>,
    pub valley_hours: Vec<HourOccupancy>,
    pub statistics: StatisticsSnapshot,
    /// From the first operating hour up to the end hour of the day.
    pub occupancy: Vec<HourOccupancy>,
    pub reservations: usize,
    pub registered_agents: usize,
}

impl DayReport {
    /// Collects the report; takes the schedule lock once, the statistics lock once.
    pub fn collect(config: &ScheduleConfig, schedule: &SharedSchedule, statistics: &RequestStatistics, registry: &AgentRegistry) -> Self {
        let (all_hours, reservations, capacity) = {
            let state = schedule.lock();
            let capacity = state.capacity.capacity();
            let hours: Vec<HourOccupancy> = state
                .capacity
                .hours()
                .map(|(hour, persons)| HourOccupancy { hour, persons, percentage: percentage(persons, capacity) })
                .collect();
            (hours, state.reservations.len(), capacity)
        };

        let max = all_hours.iter().map(|h| h.persons).max().unwrap_or(0);
        let min = all_hours.iter().map(|h| h.persons).min().unwrap_or(0);

        let peak_hours = if max > 0 { all_hours.iter().copied().filter(|h| h.persons == max).collect() } else { Vec::new() };
        let valley_hours = all_hours.iter().copied().filter(|h| h.persons == min).collect();
        let occupancy = all_hours.iter().copied().filter(|h| h.hour <= config.end_hour).collect();

        DayReport {
            capacity,
            peak_hours,
            valley_hours,
            statistics: statistics.snapshot(),
            occupancy,
            reservations,
            registered_agents: registry.len(),
        }
    }

    pub fn peak_load(&self) -> i64 {
        self.peak_hours.first().map(|h| h.persons).unwrap_or(0)
    }

    pub fn valley_load(&self) -> i64 {
        self.valley_hours.first().map(|h| h.persons).unwrap_or(0)
    }
}

impl fmt::Display for DayReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "=== END OF DAY REPORT ===".bold())?;
        writeln!(f)?;

        writeln!(f, "{}", format!("Peak hours (highest occupancy: {} persons):", self.peak_load()).red().bold())?;
        for hour in &self.peak_hours {
            writeln!(f, "  - {}:00 - {} persons", hour.hour, hour.persons)?;
        }

        writeln!(f)?;
        writeln!(f, "{}", format!("Valley hours (lowest occupancy: {} persons):", self.valley_load()).blue().bold())?;
        for hour in &self.valley_hours {
            writeln!(f, "  - {}:00 - {} persons", hour.hour, hour.persons)?;
        }

        writeln!(f)?;
        writeln!(f, "{}", "Request statistics:".green().bold())?;
        writeln!(f, "  - Accepted at requested hour: {}", self.statistics.accepted)?;
        writeln!(f, "  - Rescheduled:                {}", self.statistics.rescheduled)?;
        writeln!(f, "  - Denied:                     {}", self.statistics.denied)?;
        writeln!(f, "  - Total:                      {}", self.statistics.total())?;
        writeln!(f, "  - Reservations:               {}", self.reservations)?;
        writeln!(f, "  - Registered agents:          {}", self.registered_agents)?;

        writeln!(f)?;
        writeln!(f, "{}", "Occupancy per hour:".yellow().bold())?;
        writeln!(f, "  Hour  | Persons | Percentage")?;
        for hour in &self.occupancy {
            writeln!(f, "  {:02}:00 | {:>7} | {:>9}%", hour.hour, hour.persons, hour.percentage)?;
        }
        Ok(())
    }
}

impl fmt::Display for HourStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hour {}:00", self.hour)?;

        if !self.leaving.is_empty() {
            let families: Vec<String> = self.leaving.iter().map(|r| format!("{} ({})", r.family, r.party_size)).collect();
            write!(f, " | leaving: {}", families.join(", "))?;
        }
        if !self.entering.is_empty() {
            let families: Vec<String> =
                self.entering.iter().map(|r| format!("{} ({}, until {}:00)", r.family, r.party_size, r.exit_hour())).collect();
            write!(f, " | entering: {}", families.join(", "))?;
        }

        write!(f, " | occupancy: {}/{} ({}%)", self.occupancy, self.capacity, percentage(self.occupancy, self.capacity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::reservation_system::reservation::reservation::Reservation;
    use crate::domain::reservation_system::utils::id::{AgentId, FamilyName};
    use crate::domain::reservation_system::utils::statistics::RequestOutcome;

    fn commit(schedule: &SharedSchedule, start: i64, persons: i64) {
        let mut state = schedule.lock();
        state.reservations.add(Reservation::new(FamilyName::new("F"), AgentId::new("a"), start, persons));
        state.capacity.add_load(start, persons);
        state.capacity.add_load(start + 1, persons);
    }

    #[test]
    fn report_finds_peak_and_valley() {
        let config = ScheduleConfig::new(7, 12, 100);
        let schedule = SharedSchedule::new(&config);
        let statistics = RequestStatistics::new();
        commit(&schedule, 10, 50);
        commit(&schedule, 11, 30);
        statistics.record(RequestOutcome::Accepted);
        statistics.record(RequestOutcome::Accepted);

        let report = DayReport::collect(&config, &schedule, &statistics, &AgentRegistry::new(4));

        assert_eq!(report.peak_load(), 80);
        assert_eq!(report.peak_hours.iter().map(|h| h.hour).collect::<Vec<_>>(), vec![11]);
        assert_eq!(report.valley_load(), 0);
        assert_eq!(report.occupancy.last().map(|h| h.hour), Some(12));
        assert_eq!(report.occupancy.len(), 6);
        assert_eq!(report.reservations, 2);
        assert_eq!(report.statistics.total(), 2);
    }

    #[test]
    fn percentage_holds_at_integer_limit() {
        assert_eq!(percentage(i64::MAX, i64::MAX), 100);
        assert_eq!(percentage(i64::MAX / 2, i64::MAX), 49);
        assert_eq!(percentage(5, 0), 0);
    }

    #[test]
    fn hour_status_shows_when_entering_families_leave() {
        let status = HourStatus {
            hour: 10,
            leaving: Vec::new(),
            entering: vec![Reservation::new(FamilyName::new("Garcia"), AgentId::new("a"), 10, 4)],
            occupancy: 4,
            capacity: 100,
            activated: 1,
            deactivated: 0,
        };

        assert_eq!(status.to_string(), "Hour 10:00 | entering: Garcia (4, until 12:00) | occupancy: 4/100 (4%)");
    }

    #[test]
    fn empty_day_has_no_peak() {
        let config = ScheduleConfig::new(7, 19, 100);
        let schedule = SharedSchedule::new(&config);

        let report = DayReport::collect(&config, &schedule, &RequestStatistics::new(), &AgentRegistry::new(4));

        assert!(report.peak_hours.is_empty());
        assert_eq!(report.valley_hours.len(), 13);

        colored::control::set_override(false);
        assert!(report.to_string().contains("Total:                      0"));
    }
}
