#[cfg(feature = "cli")]
use std::sync::Mutex;
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

#[derive(Debug, Clone)]
pub struct PhaseStats {
    pub phase: String,
    pub elapsed: Duration,
    pub memory_usage_mb: Option<u64>,
}

/// 部署過程的階段計時；啟用 `cli` 時附帶行程記憶體
pub struct DeployMonitor {
    enabled: bool,
    start_time: Instant,
    #[cfg(feature = "cli")]
    system: Mutex<System>,
    #[cfg(feature = "cli")]
    pid: Option<Pid>,
}

impl DeployMonitor {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            start_time: Instant::now(),
            #[cfg(feature = "cli")]
            system: Mutex::new(System::new()),
            #[cfg(feature = "cli")]
            pid: sysinfo::get_current_pid().ok(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn stats(&self, phase: &str) -> Option<PhaseStats> {
        if !self.enabled {
            return None;
        }

        Some(PhaseStats {
            phase: phase.to_string(),
            elapsed: self.start_time.elapsed(),
            memory_usage_mb: self.memory_usage_mb(),
        })
    }

    #[cfg(feature = "cli")]
    fn memory_usage_mb(&self) -> Option<u64> {
        let pid = self.pid?;
        let mut system = self.system.lock().ok()?;
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );
        system.process(pid).map(|p| p.memory() / 1024 / 1024)
    }

    #[cfg(not(feature = "cli"))]
    fn memory_usage_mb(&self) -> Option<u64> {
        None
    }

    pub fn log_phase(&self, phase: &str) {
        if let Some(stats) = self.stats(phase) {
            match stats.memory_usage_mb {
                Some(memory) => tracing::info!(
                    "📊 {} - elapsed: {:?}, memory: {}MB",
                    stats.phase,
                    stats.elapsed,
                    memory
                ),
                None => tracing::info!("📊 {} - elapsed: {:?}", stats.phase, stats.elapsed),
            }
        }
    }
}

impl Default for DeployMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}
