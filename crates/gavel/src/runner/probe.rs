//! Resident memory sampling for running programs
//!
//! Reads `/proc/<pid>/stat` and `/proc/<pid>/status` of every process in a
//! test program's process group. On platforms without procfs every read comes
//! back empty and the reported delta is 0.

use tracing::trace;

/// Memory figures of one process or a whole group, in kilobytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProcessMemory {
    /// Current resident set size (`VmRSS`)
    pub rss_kb: u64,

    /// Peak resident set size so far (`VmHWM`)
    pub hwm_kb: u64,
}

impl ProcessMemory {
    /// Parse the contents of a `/proc/<pid>/status` file
    ///
    /// Returns `None` when neither field is present, which is the case for
    /// zombies and kernel threads.
    pub fn parse_status(content: &str) -> Option<Self> {
        let mut rss = None;
        let mut hwm = None;

        for line in content.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let slot = match key.trim() {
                "VmRSS" => &mut rss,
                "VmHWM" => &mut hwm,
                _ => continue,
            };
            *slot = value
                .trim()
                .trim_end_matches("kB")
                .trim()
                .parse::<u64>()
                .ok();
        }

        match (rss, hwm) {
            (None, None) => None,
            (rss, hwm) => {
                let rss_kb = rss.unwrap_or(0);
                Some(Self {
                    rss_kb,
                    hwm_kb: hwm.unwrap_or(rss_kb),
                })
            }
        }
    }

    /// Process group id from the contents of a `/proc/<pid>/stat` file
    ///
    /// The command name may itself contain spaces and parentheses, so fields
    /// are counted from the last `)`.
    pub fn parse_stat_pgrp(content: &str) -> Option<u32> {
        let (_, rest) = content.rsplit_once(')')?;
        // state, ppid, pgrp
        rest.split_whitespace().nth(2)?.parse().ok()
    }

    /// Sum the figures of every live process in a process group
    ///
    /// Each member contributes its own high-water mark, so the group peak is
    /// an upper bound on what the members held at the same time.
    pub async fn read_group(pgid: u32) -> Option<Self> {
        tokio::task::spawn_blocking(move || Self::scan_group(pgid))
            .await
            .ok()
            .flatten()
    }

    fn scan_group(pgid: u32) -> Option<Self> {
        let mut total: Option<Self> = None;

        for entry in std::fs::read_dir("/proc").ok()?.flatten() {
            let Some(pid) = entry
                .file_name()
                .to_str()
                .and_then(|name| name.parse::<u32>().ok())
            else {
                continue;
            };
            // Processes may exit between listing and reading
            let Ok(stat) = std::fs::read_to_string(format!("/proc/{pid}/stat")) else {
                continue;
            };
            if Self::parse_stat_pgrp(&stat) != Some(pgid) {
                continue;
            }
            let Some(mem) = std::fs::read_to_string(format!("/proc/{pid}/status"))
                .ok()
                .as_deref()
                .and_then(Self::parse_status)
            else {
                continue;
            };

            let sum = total.get_or_insert_with(Self::default);
            sum.rss_kb += mem.rss_kb;
            sum.hwm_kb += mem.hwm_kb;
        }

        total
    }
}

/// Tracks one test program's memory from spawn until exit
///
/// Follows the program's whole process group, so memory held by anything
/// the program forks counts too. The baseline is taken right after spawn;
/// every sample raises the peak.
/// The delta between the two is the coarse usage figure checked against a
/// problem's memory budget.
#[derive(Debug)]
pub struct MemoryProbe {
    pgid: Option<u32>,
    baseline_kb: u64,
    peak_kb: u64,
}

impl MemoryProbe {
    /// Take the baseline snapshot of a freshly spawned process group
    pub async fn attach(pgid: Option<u32>) -> Self {
        let baseline_kb = match pgid {
            Some(pgid) => ProcessMemory::read_group(pgid)
                .await
                .map(|mem| mem.rss_kb)
                .unwrap_or(0),
            None => 0,
        };

        Self {
            pgid,
            baseline_kb,
            peak_kb: baseline_kb,
        }
    }

    /// Take another snapshot; a no-op once the group is gone
    pub async fn sample(&mut self) {
        let Some(pgid) = self.pgid else {
            return;
        };
        if let Some(mem) = ProcessMemory::read_group(pgid).await {
            self.record(mem);
            trace!(pgid, rss_kb = mem.rss_kb, hwm_kb = mem.hwm_kb, "memory sample");
        }
    }

    fn record(&mut self, mem: ProcessMemory) {
        self.peak_kb = self.peak_kb.max(mem.hwm_kb).max(mem.rss_kb);
    }

    pub fn baseline_kb(&self) -> u64 {
        self.baseline_kb
    }

    pub fn peak_kb(&self) -> u64 {
        self.peak_kb
    }

    /// Peak minus baseline
    pub fn delta_kb(&self) -> u64 {
        self.peak_kb.saturating_sub(self.baseline_kb)
    }
}
