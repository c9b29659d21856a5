use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use ac3::process::session::fill_chunk;
use anyhow::{Context, Result};

/// File or stdin input, read in fixed-size chunks.
pub struct InputReader {
    reader: Box<dyn Read>,
    is_pipe: bool,
}

impl InputReader {
    /// Use "-" for stdin.
    pub fn new<P: AsRef<Path>>(input_path: P) -> Result<Self> {
        let path = input_path.as_ref();
        let is_pipe = path.as_os_str() == "-";

        let reader: Box<dyn Read> = if is_pipe {
            Box::new(io::stdin().lock())
        } else {
            let file = File::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            Box::new(BufReader::new(file))
        };

        Ok(Self { reader, is_pipe })
    }

    pub fn is_pipe(&self) -> bool {
        self.is_pipe
    }

    /// Hands the input to `callback` in chunks of `chunk_size` bytes.
    ///
    /// Each chunk is filled completely unless the input ends; the first short
    /// chunk is the last one. Returns the total number of bytes read.
    pub fn process_chunks<F>(&mut self, chunk_size: usize, mut callback: F) -> Result<u64>
    where
        F: FnMut(&[u8]) -> Result<()>,
    {
        let mut buffer = vec![0u8; chunk_size];
        let mut total = 0u64;

        loop {
            let (filled, result) = fill_chunk(&mut self.reader, &mut buffer);
            total += filled as u64;

            if filled > 0 {
                callback(&buffer[..filled])?;
            }

            result.with_context(|| format!("Read failed after {total} bytes"))?;

            if filled < chunk_size {
                break;
            }
        }

        Ok(total)
    }
}
