//! Post-processing of converter output
//!
//! A post-processor is a stream transform between the converter and the
//! final output. The converter writes into a bounded in-memory conduit and a
//! worker thread runs the transform over the other end. The converter never
//! buffers more than the conduit holds; it blocks when the worker falls
//! behind.

use crate::tailwind::error::ConvertError;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::io::{self, Read, Write};
use std::thread;
use tracing::debug;

/// Chunks in flight between the converter and the worker
const CONDUIT_CAPACITY: usize = 16;
/// Bytes buffered by the writing half before a chunk is sent
const CHUNK_SIZE: usize = 8 * 1024;

/// A transform from converter output to final output
pub trait PostProcess: Send + Sync {
    fn run(&self, out: &mut dyn Write, input: &mut dyn Read) -> io::Result<()>;
}

impl<F> PostProcess for F
where
    F: Fn(&mut dyn Write, &mut dyn Read) -> io::Result<()> + Send + Sync,
{
    fn run(&self, out: &mut dyn Write, input: &mut dyn Read) -> io::Result<()> {
        self(out, input)
    }
}

/// Drops the `;` that precedes a `}`
///
/// Converter output has no insignificant whitespace, so this is the only
/// byte left to save. Quoted strings and comments are copied untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Minify;

impl PostProcess for Minify {
    fn run(&self, out: &mut dyn Write, input: &mut dyn Read) -> io::Result<()> {
        let mut css = Vec::new();
        input.read_to_end(&mut css)?;
        out.write_all(&minify(&css))?;
        out.flush()
    }
}

pub fn minify(css: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(css.len());
    let mut quote: Option<u8> = None;
    let mut in_comment = false;
    let mut i = 0;

    while i < css.len() {
        let c = css[i];
        if in_comment {
            out.push(c);
            if c == b'*' && css.get(i + 1) == Some(&b'/') {
                out.push(b'/');
                i += 1;
                in_comment = false;
            }
        } else if let Some(q) = quote {
            out.push(c);
            if c == b'\\' && i + 1 < css.len() {
                i += 1;
                out.push(css[i]);
            } else if c == q {
                quote = None;
            }
        } else {
            match c {
                b'"' | b'\'' => {
                    quote = Some(c);
                    out.push(c);
                }
                b'/' if css.get(i + 1) == Some(&b'*') => {
                    in_comment = true;
                    out.extend_from_slice(b"/*");
                    i += 1;
                }
                b';' if css.get(i + 1) == Some(&b'}') => {}
                _ => out.push(c),
            }
        }
        i += 1;
    }
    out
}

/// Writing half of the conduit
pub(crate) struct PipeWriter {
    tx: Option<Sender<Vec<u8>>>,
    buf: Vec<u8>,
}

/// Reading half of the conduit
pub(crate) struct PipeReader {
    rx: Receiver<Vec<u8>>,
    chunk: Vec<u8>,
    pos: usize,
}

pub(crate) fn pipe() -> (PipeWriter, PipeReader) {
    let (tx, rx) = bounded(CONDUIT_CAPACITY);
    (
        PipeWriter {
            tx: Some(tx),
            buf: Vec::with_capacity(CHUNK_SIZE),
        },
        PipeReader {
            rx,
            chunk: Vec::new(),
            pos: 0,
        },
    )
}

fn broken_pipe() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "post-processor stopped reading")
}

impl PipeWriter {
    fn send_buffered(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let tx = self.tx.as_ref().ok_or_else(broken_pipe)?;
        let chunk = std::mem::replace(&mut self.buf, Vec::with_capacity(CHUNK_SIZE));
        tx.send(chunk).map_err(|_| broken_pipe())
    }

    /// Send what is buffered and signal end of stream to the reader.
    pub(crate) fn close(&mut self) -> io::Result<()> {
        let result = self.send_buffered();
        self.tx = None;
        result
    }
}

impl Write for PipeWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.tx.is_none() {
            return Err(broken_pipe());
        }
        self.buf.extend_from_slice(data);
        if self.buf.len() >= CHUNK_SIZE {
            self.send_buffered()?;
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.send_buffered()
    }
}

impl Read for PipeReader {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        while self.pos >= self.chunk.len() {
            match self.rx.recv() {
                Ok(chunk) => {
                    self.chunk = chunk;
                    self.pos = 0;
                }
                // all senders gone: end of stream
                Err(_) => return Ok(0),
            }
        }
        let n = out.len().min(self.chunk.len() - self.pos);
        out[..n].copy_from_slice(&self.chunk[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

fn is_broken_pipe(err: &ConvertError) -> bool {
    matches!(err, ConvertError::Io { error, .. } if error.kind() == io::ErrorKind::BrokenPipe)
}

/// Run `produce` with its output routed through `post` into `out`.
///
/// The producer runs on the calling thread and the transform on a scoped
/// worker thread, which is always joined before returning.
pub(crate) fn run_piped<W, F>(
    out: W,
    post: &dyn PostProcess,
    produce: F,
) -> Result<(), ConvertError>
where
    W: Write + Send,
    F: FnOnce(&mut dyn Write) -> Result<(), ConvertError>,
{
    let (mut writer, mut reader) = pipe();

    thread::scope(|scope| {
        let worker = scope.spawn(move || {
            let mut out = out;
            let result = post.run(&mut out, &mut reader);
            drop(reader);
            result.and_then(|_| out.flush())
        });

        let produced = produce(&mut writer).and_then(|_| {
            writer
                .close()
                .map_err(|e| ConvertError::io("[post-process]", e))
        });
        // unblock the worker even when the producer failed
        drop(writer);

        let consumed = match worker.join() {
            Ok(result) => result.map_err(ConvertError::PostProcess),
            Err(_) => Err(ConvertError::internal("[post-process]", "post-processor panicked")),
        };
        debug!(
            producer_ok = produced.is_ok(),
            consumer_ok = consumed.is_ok(),
            "post-processing finished"
        );

        match (produced, consumed) {
            (Err(p), Err(c)) if is_broken_pipe(&p) => Err(c),
            (Err(p), _) => Err(p),
            (Ok(()), consumed) => consumed,
        }
    })
}
