use combot_ml::MlService;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use sysinfo::System;
use utoipa::ToSchema;

use crate::config::MemoryConfig;
use crate::error::{ApiError, ApiResult};

/// Source of the current memory usage fraction (0.0 to 1.0)
pub trait MemoryProbe: Send + Sync {
    fn usage(&self) -> f64;
}

/// System-wide memory usage read through sysinfo
pub struct SystemMemoryProbe {
    system: Mutex<System>,
}

impl SystemMemoryProbe {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }
}

impl Default for SystemMemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProbe for SystemMemoryProbe {
    fn usage(&self) -> f64 {
        let mut system = self.system.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        system.refresh_memory();
        let total = system.total_memory();
        if total == 0 {
            return 0.0;
        }
        system.used_memory() as f64 / total as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MemoryHealth {
    Healthy,
    Warning,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MemoryStatus {
    pub memory_usage: f64,
    pub memory_threshold: f64,
    pub user_count: usize,
    pub status: MemoryHealth,
}

/// Watches memory pressure and sheds cached state when it climbs.
pub struct MemoryMonitor {
    probe: Box<dyn MemoryProbe>,
    config: MemoryConfig,
    last_cleanup: Mutex<Option<Instant>>,
    user_count: AtomicUsize,
}

impl MemoryMonitor {
    pub fn new(config: MemoryConfig) -> Self {
        Self::with_probe(config, Box::new(SystemMemoryProbe::new()))
    }

    pub fn with_probe(config: MemoryConfig, probe: Box<dyn MemoryProbe>) -> Self {
        Self {
            probe,
            config,
            last_cleanup: Mutex::new(None),
            user_count: AtomicUsize::new(0),
        }
    }

    pub fn usage(&self) -> f64 {
        self.probe.usage()
    }

    pub fn user_count(&self) -> usize {
        self.user_count.load(Ordering::Relaxed)
    }

    pub fn status(&self) -> MemoryStatus {
        let memory_usage = self.usage();
        let status = if memory_usage < self.config.cleanup_threshold {
            MemoryHealth::Healthy
        } else {
            MemoryHealth::Warning
        };

        MemoryStatus {
            memory_usage,
            memory_threshold: self.config.cleanup_threshold,
            user_count: self.user_count(),
            status,
        }
    }

    /// Usage above the cleanup threshold and the cooldown has elapsed
    pub fn should_cleanup(&self) -> bool {
        let cooldown = Duration::from_secs(self.config.cleanup_cooldown_secs);
        let last = *self.last_cleanup.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if last.is_some_and(|at| at.elapsed() < cooldown) {
            return false;
        }

        let usage = self.usage();
        if usage > self.config.cleanup_threshold {
            tracing::warn!(
                usage = format!("{:.1}%", usage * 100.0),
                threshold = self.config.cleanup_threshold,
                "Memory usage exceeds cleanup threshold"
            );
            return true;
        }
        false
    }

    /// Drop cached classifications and idle models
    pub async fn cleanup(&self, ml: &MlService) {
        *self.last_cleanup.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(Instant::now());

        let results = ml.clear_results().await;
        let models = ml.cleanup_idle_models().await;
        tracing::info!(cleared_results = results, unloaded_models = models, "Memory cleanup completed");
    }

    /// Count one chat turn; true once the per-process user budget is used up
    pub fn register_user(&self) -> bool {
        let count = self.user_count.fetch_add(1, Ordering::Relaxed) + 1;
        count >= self.config.max_users_per_process
    }

    /// Run before every chat turn: clean up under pressure, refuse while usage
    /// stays above the critical threshold (cooldown or not)
    pub async fn guard(&self, ml: &MlService) -> ApiResult<()> {
        if self.should_cleanup() {
            self.cleanup(ml).await;
        }

        let usage = self.usage();
        if usage > self.config.critical_threshold {
            return Err(ApiError::Memory {
                usage,
                threshold: self.config.critical_threshold,
            });
        }

        if self.register_user() {
            tracing::warn!(
                user_count = self.user_count(),
                limit = self.config.max_users_per_process,
                "Process has served its user budget"
            );
        }

        Ok(())
    }
}
