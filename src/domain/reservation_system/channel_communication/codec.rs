use std::io;
use std::marker::PhantomData;

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::domain::reservation_system::channel_communication::protocol::WireRecord;

/// Bincode body zero-padded to `T::RECORD_SIZE`, so every record is one
/// fixed-size write on the channel.
#[derive(Debug)]
pub struct RecordCodec<T> {
    _marker: PhantomData<T>,
}

impl<T> RecordCodec<T> {
    pub fn new() -> Self {
        Self { _marker: PhantomData }
    }
}

impl<T> Default for RecordCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: WireRecord> Encoder<T> for RecordCodec<T> {
    type Error = io::Error;

    fn encode(&mut self, item: T, dst: &mut BytesMut) -> Result<(), Self::Error> {
        item.validate().map_err(|reason| io::Error::new(io::ErrorKind::InvalidInput, reason))?;

        let bytes = bincode::serialize(&item).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        if bytes.len() > T::RECORD_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("encoded record is {} bytes, record size is {}", bytes.len(), T::RECORD_SIZE),
            ));
        }

        dst.reserve(T::RECORD_SIZE);
        dst.put_slice(&bytes);
        dst.put_bytes(0, T::RECORD_SIZE - bytes.len());
        Ok(())
    }
}

impl<T: WireRecord> Decoder for RecordCodec<T> {
    type Item = T;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < T::RECORD_SIZE {
            return Ok(None);
        }

        let record = src.split_to(T::RECORD_SIZE);
        let item = bincode::deserialize(&record).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(Some(item))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(item) => Ok(Some(item)),
            None if src.is_empty() => Ok(None),
            None => Err(io::Error::new(io::ErrorKind::UnexpectedEof, format!("short record of {} bytes", src.len()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::domain::reservation_system::channel_communication::protocol::{
        AgentMessage, ControllerResponse, MAX_NAME_LEN, MAX_TEXT_LEN, REQUEST_RECORD_SIZE, RESPONSE_RECORD_SIZE,
    };

    fn assert_fixed_size_round_trip<T: WireRecord + Clone + PartialEq + std::fmt::Debug>(record: T) {
        let mut codec = RecordCodec::<T>::new();
        let mut buffer = BytesMut::new();

        codec.encode(record.clone(), &mut buffer).unwrap();
        assert_eq!(buffer.len(), T::RECORD_SIZE, "{:?}", record);

        assert_eq!(codec.decode(&mut buffer).unwrap(), Some(record));
        assert!(buffer.is_empty());
    }

    #[test]
    fn records_are_padded_to_fixed_size() {
        let mut codec = RecordCodec::<AgentMessage>::new();
        let mut buffer = BytesMut::new();

        codec.encode(AgentMessage::Done { agent_id: "agent-1".to_string() }, &mut buffer).unwrap();
        assert_eq!(buffer.len(), REQUEST_RECORD_SIZE);

        let decoded = codec.decode(&mut buffer).unwrap();
        assert_eq!(decoded, Some(AgentMessage::Done { agent_id: "agent-1".to_string() }));
        assert!(buffer.is_empty());
    }

    #[test]
    fn largest_response_fits_its_record() {
        let mut codec = RecordCodec::<ControllerResponse>::new();
        let mut buffer = BytesMut::new();
        let response = ControllerResponse::Rescheduled { assigned_hour: 18, current_hour: 17, message: "m".repeat(MAX_TEXT_LEN) };

        codec.encode(response.clone(), &mut buffer).unwrap();

        assert_eq!(buffer.len(), RESPONSE_RECORD_SIZE);
        assert_eq!(codec.decode(&mut buffer).unwrap(), Some(response));
    }

    #[test]
    fn every_message_at_field_limits_fits_its_record() {
        let name = "n".repeat(MAX_NAME_LEN);
        let channel = PathBuf::from(format!("/{}", "p".repeat(MAX_NAME_LEN - 1)));
        let text = "t".repeat(MAX_TEXT_LEN);

        for message in [
            AgentMessage::Register { agent_id: name.clone(), response_channel: channel.clone() },
            AgentMessage::Reserve {
                agent_id: name.clone(),
                response_channel: channel.clone(),
                family: name.clone(),
                requested_hour: i64::MIN,
                party_size: i64::MAX,
            },
            AgentMessage::Done { agent_id: name.clone() },
        ] {
            assert_fixed_size_round_trip(message);
        }

        for response in [
            ControllerResponse::CurrentHour { hour: i64::MAX },
            ControllerResponse::Approved { assigned_hour: i64::MAX, current_hour: i64::MIN, message: text.clone() },
            ControllerResponse::Rescheduled { assigned_hour: i64::MAX, current_hour: i64::MIN, message: text.clone() },
            ControllerResponse::Denied { current_hour: i64::MIN, message: text.clone() },
            ControllerResponse::DayEnd,
        ] {
            assert_fixed_size_round_trip(response);
        }
    }

    #[test]
    fn over_long_fields_are_rejected_at_encode_time() {
        let mut codec = RecordCodec::<AgentMessage>::new();
        let mut buffer = BytesMut::new();
        let message = AgentMessage::Register { agent_id: "a".repeat(300), response_channel: PathBuf::from("/tmp/pipe") };

        let err = codec.encode(message, &mut buffer).unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(buffer.is_empty());
    }

    #[test]
    fn partial_record_is_not_decoded() {
        let mut codec = RecordCodec::<AgentMessage>::new();
        let mut buffer = BytesMut::from(&[0u8; 10][..]);

        assert_eq!(codec.decode(&mut buffer).unwrap(), None);
        assert!(codec.decode_eof(&mut buffer).is_err());
    }

    #[test]
    fn garbage_record_is_invalid_data() {
        let mut codec = RecordCodec::<AgentMessage>::new();
        let mut buffer = BytesMut::from(&[0xffu8; REQUEST_RECORD_SIZE][..]);

        let err = codec.decode(&mut buffer).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
