//! Streaming engine reports into arbitrary writers.
//!
//! Engines write their reports into a file-like sink and block until everything is written. To
//! forward a report into a generic writer without buffering all of it, the engine writes into a
//! pipe while a drain thread copies the pipe into the destination. The drain is started before
//! the engine writes anything, so a report larger than the pipe's capacity cannot deadlock.
use std::io::{self, BufWriter, Write};
use std::panic;
use std::thread;

use log::trace;

use crate::error::Error;

/// Run `produce` with a sink whose contents are copied into `out` concurrently.
///
/// Returns after the sink is closed and everything written to it reached `out`. The first error
/// is reported: a failing producer takes precedence over a failing drain, unless the producer
/// only failed because the drain stopped reading.
pub fn redirect<W>(
    out: &mut W,
    produce: impl FnOnce(&mut dyn Write) -> Result<(), Error>,
) -> Result<(), Error>
where
    W: Write + Send + ?Sized,
{
    let (mut reader, writer) = io::pipe()?;

    thread::scope(|scope| {
        let drain = scope.spawn(move || -> io::Result<u64> {
            let copied = io::copy(&mut reader, out)?;
            out.flush()?;
            Ok(copied)
        });

        let mut sink = BufWriter::new(writer);
        let produced = produce(&mut sink).and_then(|()| Ok(sink.flush()?));
        // Closing the write end ends the drain's copy loop.
        drop(sink);

        let drained = match drain.join() {
            Ok(drained) => drained,
            Err(payload) => panic::resume_unwind(payload),
        };

        match (produced, drained) {
            (Ok(()), Ok(copied)) => {
                trace!("redirected {} bytes", copied);
                Ok(())
            }
            (Err(Error::Io { ref cause }), Err(drain_err))
                if cause.kind() == io::ErrorKind::BrokenPipe =>
            {
                Err(drain_err.into())
            }
            (Err(err), _) => Err(err),
            (Ok(()), Err(drain_err)) => Err(drain_err.into()),
        }
    })
}
