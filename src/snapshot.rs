//! Reading snapshots from the outside world.
//!
//! An [`Opener`] yields the raw bytes of the current snapshot, a
//! [`SnapshotDecoder`] turns them into a [`Snapshot`], and a [`SnapshotSource`]
//! combines the two for the delayed strategy's refresh loop.
//!
//! The line format holds a single line of whitespace-separated tokens: the
//! arm count followed by the mean reward of every arm, optionally followed by
//! the pull count of every arm:
//!
//! ```text
//! 2 0.100000 0.500000 10 20
//! 2 0.100000 0.500000
//! ```
//!
//! The first form is canonical. A line without counts applies zero pulls to
//! every arm, which leaves UCB1 in its warm-up and Thompson on its prior.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use crate::counters::Snapshot;
use crate::error::{BanditError, Result};

/// Reopens the underlying snapshot stream on demand.
pub trait Opener: Send + Sync {
    fn open(&self) -> io::Result<Box<dyn Read + Send>>;
}

/// Opens a snapshot file from disk.
#[derive(Clone, Debug)]
pub struct FileOpener {
    path: PathBuf,
}

impl FileOpener {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Opener for FileOpener {
    fn open(&self) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(File::open(&self.path)?))
    }
}

/// Decodes a byte stream into a snapshot.
pub trait SnapshotDecoder: Send + Sync {
    fn decode(&self, reader: &mut dyn Read) -> Result<Snapshot>;
}

/// Decoder for the single-line text format.
#[derive(Clone, Copy, Debug, Default)]
pub struct LineDecoder;

impl SnapshotDecoder for LineDecoder {
    fn decode(&self, reader: &mut dyn Read) -> Result<Snapshot> {
        let mut line = None;
        for next in BufReader::new(reader).lines() {
            let next = next?;
            if next.trim().is_empty() {
                continue;
            }
            if line.is_some() {
                return Err(invalid("more than one line in snapshot"));
            }
            line = Some(next);
        }
        parse_line(&line.ok_or_else(|| invalid("empty snapshot"))?)
    }
}

/// Decoder for JSON-encoded snapshots.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonDecoder;

impl SnapshotDecoder for JsonDecoder {
    fn decode(&self, reader: &mut dyn Read) -> Result<Snapshot> {
        let snapshot: Snapshot = serde_json::from_reader(reader)?;
        snapshot.validate()?;
        Ok(snapshot)
    }
}

fn invalid(message: impl Into<String>) -> BanditError {
    BanditError::InvalidSnapshot {
        message: message.into(),
    }
}

/// Parses one snapshot line.
pub fn parse_line(line: &str) -> Result<Snapshot> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let (arms, rest) = fields
        .split_first()
        .ok_or_else(|| invalid("empty snapshot"))?;
    let arms: usize = arms
        .parse()
        .map_err(|e| invalid(format!("arms not an integer: {e}")))?;
    if arms == 0 {
        return Err(BanditError::EmptySnapshot);
    }

    let (values, counts) = match rest.len() {
        n if n == arms => (rest, None),
        n if n == 2 * arms => {
            let (values, counts) = rest.split_at(arms);
            (values, Some(counts))
        }
        n => {
            return Err(invalid(format!(
                "{arms} arms need {arms} or {} fields, got {n}",
                2 * arms
            )));
        }
    };

    let values = values
        .iter()
        .map(|v| {
            v.parse::<f64>()
                .map_err(|e| invalid(format!("reward '{v}' malformed: {e}")))
        })
        .collect::<Result<Vec<_>>>()?;

    let counts = counts
        .map(|counts| {
            counts
                .iter()
                .map(|c| {
                    c.parse::<u64>()
                        .map_err(|e| invalid(format!("count '{c}' malformed: {e}")))
                })
                .collect::<Result<Vec<_>>>()
        })
        .transpose()?;

    Ok(Snapshot {
        arms,
        values,
        counts,
        seed: None,
    })
}

/// Canonical line encoding: arm count, mean rewards, then pull counts when
/// the snapshot has them.
pub fn encode_line(snapshot: &Snapshot) -> String {
    let mut line = encode_means_line(snapshot);
    if let Some(counts) = &snapshot.counts {
        for count in counts {
            line.push(' ');
            line.push_str(&count.to_string());
        }
    }
    line
}

/// Arm count and mean rewards only; pull counts are dropped.
pub fn encode_means_line(snapshot: &Snapshot) -> String {
    let mut tokens = vec![snapshot.arms.to_string()];
    tokens.extend(snapshot.values.iter().map(|v| format!("{v:.6}")));
    tokens.join(" ")
}

/// Something that can produce the current snapshot.
pub trait SnapshotSource: Send + Sync {
    fn fetch(&self) -> Result<Snapshot>;
}

impl<F> SnapshotSource for F
where
    F: Fn() -> Result<Snapshot> + Send + Sync,
{
    fn fetch(&self) -> Result<Snapshot> {
        self()
    }
}

/// Pairs an opener with a decoder.
pub struct OpenerSource<O, D> {
    opener: O,
    decoder: D,
}

impl<O: Opener, D: SnapshotDecoder> OpenerSource<O, D> {
    pub fn new(opener: O, decoder: D) -> Self {
        Self { opener, decoder }
    }
}

impl OpenerSource<FileOpener, LineDecoder> {
    /// A line-format snapshot file.
    pub fn line_file(path: impl Into<PathBuf>) -> Self {
        Self::new(FileOpener::new(path), LineDecoder)
    }
}

impl<O: Opener, D: SnapshotDecoder> SnapshotSource for OpenerSource<O, D> {
    fn fetch(&self) -> Result<Snapshot> {
        let mut reader = self.opener.open()?;
        self.decoder.decode(&mut reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn decode_line(input: &str) -> Result<Snapshot> {
        LineDecoder.decode(&mut Cursor::new(input.as_bytes().to_vec()))
    }

    #[test]
    fn test_parse_snapshot() {
        let snapshot = decode_line("2 0.120000 0.300000").unwrap();
        assert_eq!(snapshot.arms, 2);
        assert_eq!(snapshot.values, vec![0.12, 0.3]);
        assert_eq!(snapshot.counts, None);
    }

    #[test]
    fn test_parse_snapshot_with_counts() {
        let snapshot = decode_line("2 0.5 0.25 10 4\n").unwrap();
        assert_eq!(snapshot.values, vec![0.5, 0.25]);
        assert_eq!(snapshot.counts, Some(vec![10, 4]));
    }

    #[test]
    fn test_parse_snapshot_errors() {
        assert!(decode_line("").is_err());
        assert!(decode_line("x 0.1").is_err());
        assert!(decode_line("2 0.1").is_err());
        assert!(decode_line("2 0.1 0.2 0.3").is_err());
        assert!(decode_line("2 0.1 abc").is_err());
        assert!(decode_line("2 0.1 0.2 1 -1").is_err());
        assert!(decode_line("1 0.1\n1 0.2").is_err());
        assert!(matches!(decode_line("0"), Err(BanditError::EmptySnapshot)));
    }

    #[test]
    fn test_encode_line() {
        let snapshot = Snapshot::from_observations(2, [(2, 1.0), (2, 0.0)]).unwrap();
        assert_eq!(encode_line(&snapshot), "2 0.000000 0.500000 0 2");
        assert_eq!(encode_means_line(&snapshot), "2 0.000000 0.500000");

        let decoded = decode_line(&encode_line(&snapshot)).unwrap();
        assert_eq!(decoded, snapshot);

        // no counts to carry
        let means = Snapshot::new(vec![0.25, 0.5]);
        assert_eq!(encode_line(&means), "2 0.250000 0.500000");
    }

    #[test]
    fn test_json_decoder() {
        let json = r#"{"arms": 2, "values": [0.1, 0.9], "counts": [3, 7]}"#;
        let snapshot = JsonDecoder
            .decode(&mut Cursor::new(json.as_bytes().to_vec()))
            .unwrap();
        assert_eq!(snapshot.counts, Some(vec![3, 7]));
        assert_eq!(snapshot.seed, None);

        let ragged = r#"{"arms": 3, "values": [0.1, 0.9]}"#;
        assert!(
            JsonDecoder
                .decode(&mut Cursor::new(ragged.as_bytes().to_vec()))
                .is_err()
        );
        assert!(matches!(
            JsonDecoder.decode(&mut Cursor::new(b"{".to_vec())),
            Err(BanditError::Json(_))
        ));
    }

    #[test]
    fn test_file_source() {
        let path = std::env::temp_dir().join(format!(
            "banditry-snapshot-{}-{}.txt",
            std::process::id(),
            line!()
        ));
        std::fs::write(&path, "3 0.1 0.2 0.3\n").unwrap();

        let source = OpenerSource::line_file(&path);
        let snapshot = source.fetch().unwrap();
        assert_eq!(snapshot.values, vec![0.1, 0.2, 0.3]);

        std::fs::remove_file(&path).unwrap();
        assert!(matches!(source.fetch(), Err(BanditError::Io(_))));
    }

    #[test]
    fn test_closure_source() {
        let source = || -> Result<Snapshot> { Ok(Snapshot::new(vec![0.5])) };
        assert_eq!(source.fetch().unwrap().arms, 1);
    }
}
