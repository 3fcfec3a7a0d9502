use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde_json::de::IoRead;
use serde_json::{Deserializer, StreamDeserializer, Value};

use super::{EventSource, SourceError};

/// Reads whitespace-separated JSON values: one object, JSON lines, or
/// pretty-printed objects back to back.
pub struct JsonEventSource<R: Read> {
    stream: StreamDeserializer<'static, IoRead<R>, Value>,
    index: usize,
}

impl JsonEventSource<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: Read> JsonEventSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            stream: Deserializer::from_reader(reader).into_iter::<Value>(),
            index: 0,
        }
    }
}

impl<R: Read> EventSource for JsonEventSource<R> {
    fn next_event(&mut self) -> Result<Option<Value>, SourceError> {
        let next = match self.stream.next() {
            Some(next) => next,
            None => return Ok(None),
        };
        let index = self.index;
        self.index += 1;
        match next {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_io() => Err(SourceError::Io(err.into())),
            Err(err) => Err(SourceError::Json {
                index,
                message: err.to_string(),
            }),
        }
    }
}
