use log::debug;
use crate::error::{Error, Result};




/**
 * How a kernel is executed: on the calling thread, or data-parallel over
 * the elements of each phase. A parallel execution with a thread count runs
 * inside a dedicated Rayon pool of that size; without one it uses the
 * global pool.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum Execution {
    #[default]
    Sequential,
    Parallel {
        num_threads: Option<usize>,
    },
}




// ============================================================================
impl Execution {

    pub fn parallel() -> Self {
        Execution::Parallel { num_threads: None }
    }

    pub fn with_threads(num_threads: usize) -> Self {
        Execution::Parallel { num_threads: Some(num_threads) }
    }

    pub fn is_parallel(&self) -> bool {
        matches!(self, Execution::Parallel { .. })
    }


    /**
     * Run a closure in the thread pool this execution calls for. Sequential
     * executions, and parallel ones without a thread count, run it on the
     * calling thread.
     */
    pub fn install<R, F>(&self, f: F) -> Result<R>
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        match self {
            Execution::Parallel { num_threads: Some(num_threads) } => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(*num_threads)
                    .build()
                    .map_err(|e| Error::ThreadPool(e.to_string()))?;
                debug!("installed rayon pool with {} threads", pool.current_num_threads());
                Ok(pool.install(f))
            }
            _ => Ok(f()),
        }
    }
}
