use std::io::Write;
use std::sync::Arc;

use rvtlm_core::MemoryTarget;
use rvtlm_core::config::MemoryConfig;
use tempfile::NamedTempFile;

use crate::common::mocks::listener::RecordingListener;

/// Installs a test-friendly tracing subscriber once per process.
///
/// Output is filtered by `RUST_LOG` and captured by the test harness.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Memory target wired to a recording invalidation listener.
pub struct TestContext {
    pub mem: MemoryTarget,
    pub listener: Arc<RecordingListener>,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    /// Default-sized memory (1024 words, latency 10, 4-byte bus).
    pub fn new() -> Self {
        Self::with_config(&MemoryConfig::default())
    }

    pub fn with_config(config: &MemoryConfig) -> Self {
        init_tracing();

        let mut mem = MemoryTarget::new(config).unwrap();
        let listener = Arc::new(RecordingListener::new());
        mem.set_invalidation_listener(listener.clone());

        Self { mem, listener }
    }

    /// Memory of `size_words` words with otherwise default parameters.
    pub fn with_words(size_words: usize) -> Self {
        Self::with_config(&MemoryConfig {
            size_words,
            ..MemoryConfig::default()
        })
    }

    /// Invalidated ranges seen by the listener.
    pub fn invalidations(&self) -> Vec<(u64, u64)> {
        self.listener.calls()
    }

    /// Reads `len` bytes through the debug path.
    pub fn peek(&mut self, addr: u64, len: usize) -> Vec<u8> {
        let mut out = vec![0u8; len];
        let _ = self.mem.debug_read(addr, &mut out).unwrap();
        out
    }

    /// Reads the whole memory through the debug path.
    pub fn snapshot(&mut self) -> Vec<u8> {
        let cap = self.mem.capacity() as usize;
        self.peek(0, cap)
    }
}

/// Writes `text` to a fresh temporary file that lives as long as the handle.
pub fn temp_image(text: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
