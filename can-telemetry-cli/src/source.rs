//! JSON-lines frame source
//!
//! Stands in for the bus subscription: every non-empty line of the input is
//! one raw message body, handed on exactly as read.

use anyhow::{Context, Result};
use can_telemetry_decoder::FrameEnvelope;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

/// Where frames come from
#[derive(Debug, Clone)]
pub enum Input {
    File(PathBuf),
    Stdin,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReplayOptions {
    /// Sleep each envelope's `meta` milliseconds before handing it on
    pub honor_timing: bool,
    /// Start over at end of file, pausing one second between passes
    pub continuous: bool,
    /// Stop after this many lines
    pub max_frames: Option<usize>,
}

const PASS_PAUSE: Duration = Duration::from_secs(1);

/// Feed every line of `input` to `on_frame`, returning the number of lines delivered
pub fn replay<F>(input: &Input, options: ReplayOptions, mut on_frame: F) -> Result<usize>
where
    F: FnMut(&[u8]),
{
    let mut delivered = 0;
    let mut pass = 0;

    loop {
        pass += 1;
        let reader: Box<dyn BufRead> = match input {
            Input::File(path) => {
                let file = File::open(path).with_context(|| format!("Failed to open log file: {:?}", path))?;
                Box::new(BufReader::new(file))
            }
            Input::Stdin => Box::new(io::stdin().lock()),
        };
        if options.continuous {
            log::info!("Starting replay pass {}", pass);
        }

        for line in reader.lines() {
            let line = line.context("Failed to read input")?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if options.max_frames.is_some_and(|max| delivered >= max) {
                return Ok(delivered);
            }

            if options.honor_timing {
                wait_for_delta(line);
            }
            on_frame(line.as_bytes());
            delivered += 1;

            if delivered % 1000 == 0 {
                log::debug!("Processed {} frames", delivered);
            }
        }

        if !options.continuous {
            break;
        }
        if matches!(input, Input::Stdin) {
            log::warn!("Continuous mode needs a file input, stopping at end of stdin");
            break;
        }
        log::info!("Completed pass {}, pausing before the next one", pass);
        thread::sleep(PASS_PAUSE);
    }

    Ok(delivered)
}

fn wait_for_delta(line: &str) {
    let Ok(envelope) = FrameEnvelope::from_json(line.as_bytes()) else {
        return;
    };
    if let Some(delta) = envelope.arrival_delta_ms().filter(|delta| *delta > 0) {
        if delta > 100 {
            log::debug!("Frame {}: waiting {}ms", envelope.identifier, delta);
        }
        thread::sleep(Duration::from_millis(delta));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_log(dir: &tempfile::TempDir, lines: &str) -> Input {
        let path = dir.path().join("frames.jsonl");
        fs::write(&path, lines).unwrap();
        Input::File(path)
    }

    #[test]
    fn test_replay_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_log(&dir, "{\"id\":\"6B0\"}\n\n   \n{\"id\":\"351\"}\nnot json\n");

        let mut seen = Vec::new();
        let count = replay(&input, ReplayOptions::default(), |line| seen.push(line.to_vec())).unwrap();
        assert_eq!(count, 3);
        assert_eq!(seen[2], b"not json".to_vec());
    }

    #[test]
    fn test_max_frames_bounds_continuous_replay() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_log(&dir, "{\"id\":\"6B0\"}\n{\"id\":\"6B1\"}\n");
        let options = ReplayOptions {
            continuous: true,
            max_frames: Some(3),
            ..ReplayOptions::default()
        };

        let count = replay(&input, options, |_| {}).unwrap();
        assert_eq!(count, 3);
    }

    #[test]
    fn test_timing_uses_meta_delay() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_log(&dir, "{\"id\":\"6B0\",\"meta\":30}\n{\"id\":\"6B0\",\"meta\":\"20\"}\n");
        let options = ReplayOptions { honor_timing: true, ..ReplayOptions::default() };

        let started = std::time::Instant::now();
        replay(&input, options, |_| {}).unwrap();
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_missing_file() {
        let input = Input::File(PathBuf::from("/nonexistent/frames.jsonl"));
        assert!(replay(&input, ReplayOptions::default(), |_| {}).is_err());
    }
}
