//! Consumer threads, optionally pinned to a CPU core (Linux).
//!
//! ```rust,ignore
//! use kaos_disruptor::affinity::spawn_consumer;
//! let handle = spawn_consumer("stage-1", Some(2), consumer.clone())?;
//! ```

use std::io;
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::disruptor::{BatchConsumer, BatchHandler, Entry};
use crate::error::Result;

/// Pin current thread to a specific CPU core.
#[cfg(target_os = "linux")]
pub fn pin_to_core(core_id: usize) -> io::Result<()> {
    use libc::{cpu_set_t, sched_setaffinity, CPU_SET, CPU_SETSIZE, CPU_ZERO};

    if core_id >= CPU_SETSIZE as usize {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("core {} is outside the CPU set", core_id),
        ));
    }

    let mut set: cpu_set_t = unsafe { std::mem::zeroed() };
    unsafe {
        CPU_ZERO(&mut set);
        CPU_SET(core_id, &mut set);

        if sched_setaffinity(0, std::mem::size_of::<cpu_set_t>(), &set) != 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
pub fn pin_to_core(_core_id: usize) -> io::Result<()> {
    Err(io::Error::new(io::ErrorKind::Unsupported, "Linux only"))
}

/// Spawn a named thread running `consumer` until it is halted.
///
/// With `core`, the thread pins itself first; if pinning fails it logs a
/// warning and runs unpinned.
pub fn spawn_consumer<T, H>(
    name: impl Into<String>,
    core: Option<usize>,
    consumer: Arc<BatchConsumer<T, H>>,
) -> io::Result<JoinHandle<Result<()>>>
where
    T: Entry,
    H: BatchHandler<T> + 'static,
{
    std::thread::Builder::new().name(name.into()).spawn(move || {
        if let Some(core) = core {
            if let Err(e) = pin_to_core(core) {
                trace_warn!("could not pin consumer to core {}: {}", core, e);
            }
        }
        consumer.run()
    })
}
