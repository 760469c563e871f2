//! Recording file format
//!
//! ```text
//! frequency=38000
//! size=8
//! data=00120034007fffff
//! ```
//!
//! `size` counts bytes of `data`.
use std::fmt;
use std::io::{self, Read, Write};
use std::path::Path;
use std::str::FromStr;

use crate::constants::{DEFAULT_CAPACITY, DEFAULT_FREQUENCY};
use crate::error::{Error, Result};
use crate::waveform::Waveform;

/// A captured or loaded waveform with the carrier it is sent on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recording {
    pub frequency: u32,
    pub waveform: Waveform,
}

impl fmt::Display for Recording {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "frequency={}", self.frequency)?;
        writeln!(f, "size={}", self.waveform.as_bytes().len())?;
        writeln!(f, "data={}", hex::encode(self.waveform.as_bytes()))
    }
}

impl FromStr for Recording {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Recording::parse(s, DEFAULT_CAPACITY)
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Format(format!("{} is not a number: {:?}", key, value.trim())))
}

impl Recording {
    /// Parse a recording; `capacity` bounds the waveform, in entries.
    ///
    /// Unknown lines are ignored.
    pub fn parse(s: &str, capacity: usize) -> Result<Self> {
        let mut frequency = DEFAULT_FREQUENCY;
        let mut size = None;
        let mut data = Vec::new();

        for line in s.lines() {
            let line = line.trim_end_matches('\r');
            if let Some(value) = line.strip_prefix("frequency=") {
                frequency = parse_number("frequency", value)?;
            } else if let Some(value) = line.strip_prefix("size=") {
                size = Some(parse_number::<usize>("size", value)?);
            } else if let Some(value) = line.strip_prefix("data=") {
                data = hex::decode(value.trim())
                    .map_err(|e| Error::Format(format!("bad data: {}", e)))?;
            }
        }

        match size {
            Some(size) if size > data.len() => {
                return Err(Error::Format(format!(
                    "size {} exceeds the {} bytes of data",
                    size,
                    data.len()
                )));
            }
            Some(size) => data.truncate(size),
            None => (),
        }

        Ok(Recording {
            frequency,
            waveform: Waveform::from_bytes(&data, capacity)?,
        })
    }
}

/// Read a recording from `path`, or from stdin when `path` is `-`.
pub fn read_recording<P: AsRef<Path>>(path: P, capacity: usize) -> Result<Recording> {
    let p = path.as_ref();
    let raw = if p == Path::new("-") {
        let mut raw = String::new();
        io::stdin().read_to_string(&mut raw)?;
        raw
    } else {
        std::fs::read_to_string(p)?
    };
    let recording = Recording::parse(&raw, capacity)?;
    log::info!(
        "Read {} entries at {} Hz from {}",
        recording.waveform.len(),
        recording.frequency,
        p.display()
    );
    Ok(recording)
}

pub fn write_recording<P: AsRef<Path>>(path: P, recording: &Recording) -> Result<()> {
    let mut file = std::fs::File::create(path.as_ref())?;
    write!(file, "{}", recording)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let rec: Recording = "frequency=40000\nsize=8\ndata=00120034007fffff\n"
            .parse()
            .unwrap();
        assert_eq!(rec.frequency, 40000);
        assert_eq!(rec.waveform.len(), 2);
        assert_eq!(
            rec.waveform.as_bytes(),
            &[0x00, 0x12, 0x00, 0x34, 0x00, 0x7f, 0xff, 0xff]
        );
    }

    #[test]
    fn test_display() {
        let rec = Recording {
            frequency: 38000,
            waveform: Waveform::from_bytes(&[0xab, 0xcd, 0x7f, 0xff], 10).unwrap(),
        };
        assert_eq!(rec.to_string(), "frequency=38000\nsize=4\ndata=abcd7fff\n");
        assert_eq!(rec.to_string().parse::<Recording>().unwrap().waveform, rec.waveform);
    }

    #[test]
    fn test_defaults() {
        let rec: Recording = "# comment\r\ndata=01020304\r\n".parse().unwrap();
        assert_eq!(rec.frequency, DEFAULT_FREQUENCY);
        assert_eq!(rec.waveform.len(), 1);

        let rec: Recording = "frequency=38000\n".parse().unwrap();
        assert!(rec.waveform.is_empty());
    }

    #[test]
    fn test_size_truncates() {
        let rec: Recording = "size=4\ndata=0102030405060708\n".parse().unwrap();
        assert_eq!(rec.waveform.as_bytes(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(
            "size=12\ndata=01020304\n".parse::<Recording>(),
            Err(Error::Format(_))
        ));
        assert!(matches!(
            "data=010203\n".parse::<Recording>(),
            Err(Error::Format(_))
        ));
        assert!(matches!(
            "data=zz\n".parse::<Recording>(),
            Err(Error::Format(_))
        ));
        assert!(matches!(
            "frequency=fast\n".parse::<Recording>(),
            Err(Error::Format(_))
        ));
        assert!(Recording::parse("data=0102030405060708\n", 1).is_err());
    }

    #[test]
    fn test_write_and_read_file() {
        let path = std::env::temp_dir().join(format!("remocon-format-{}.txt", std::process::id()));
        let rec = Recording {
            frequency: 36000,
            waveform: Waveform::from_bytes(&[0, 1, 2, 3, 4, 5, 6, 7], 10).unwrap(),
        };
        write_recording(&path, &rec).unwrap();
        let read = read_recording(&path, 10).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(read, rec);
    }
}
