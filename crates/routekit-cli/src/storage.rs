//! Persistent run reports under `report_dir` (default `.routekit/reports/`)
//!
//! Every `routekit test` run that sends requests is saved unless `--no-save`
//! is given. Directory layout: `{host_port}_{timestamp}/` holding
//! `summary.json`, `results.json` and `config.toml`.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use routekit_core::{Config, TestReport};

/// Everything needed to persist one test run.
pub struct RunRecord<'a> {
    pub config: &'a Config,
    pub report: &'a TestReport,
    pub endpoints_file: &'a Path,
    pub duration_secs: f64,
}

/// Write the run under `{base}/{host_port}_{timestamp}/`.
///
/// Returns the run directory on success.
pub fn save_report(record: &RunRecord, base: &Path) -> Result<PathBuf, std::io::Error> {
    let now = UtcStamp::now();
    let run_dir = base.join(run_dir_name(&record.config.test.base_url, &now));
    std::fs::create_dir_all(&run_dir)?;

    let config_toml = record
        .config
        .to_toml()
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    std::fs::write(run_dir.join("config.toml"), config_toml)?;

    let summary = serde_json::json!({
        "verdict": if record.report.all_passed() { "pass" } else { "fail" },
        "summary": record.report.summary,
        "meta": {
            "timestamp": now.iso(),
            "durationSecs": record.duration_secs,
            "baseUrl": record.config.test.base_url,
            "endpoints": record.endpoints_file.display().to_string(),
            "validateSchema": record.config.test.validate_schema,
        },
    });
    write_json(&run_dir.join("summary.json"), &summary)?;
    write_json(&run_dir.join("results.json"), &record.report.results)?;

    Ok(run_dir)
}

fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), std::io::Error> {
    let text = serde_json::to_string_pretty(value).map_err(std::io::Error::other)?;
    std::fs::write(path, text)
}

/// `localhost_3000_20261018T093000`
fn run_dir_name(base_url: &str, stamp: &UtcStamp) -> String {
    format!("{}_{}", host_port(base_url), stamp.compact())
}

/// `"http://localhost:3000/api"` → `"localhost_3000"`
fn host_port(url: &str) -> String {
    let authority = url
        .split_once("://")
        .map_or(url, |(_, rest)| rest)
        .split(['/', '?'])
        .next()
        .unwrap_or_default();
    if authority.is_empty() {
        return "unknown".to_string();
    }
    authority.replace(':', "_")
}

/// Broken-down UTC time, enough for directory names and ISO stamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct UtcStamp {
    year: i64,
    month: u32,
    day: u32,
    hour: u64,
    minute: u64,
    second: u64,
}

impl UtcStamp {
    fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self::from_epoch_secs(secs)
    }

    fn from_epoch_secs(secs: u64) -> Self {
        let (year, month, day) = civil_from_days(i64::try_from(secs / 86_400).unwrap_or(0));
        let tod = secs % 86_400;
        Self {
            year,
            month,
            day,
            hour: tod / 3600,
            minute: (tod % 3600) / 60,
            second: tod % 60,
        }
    }

    /// Filesystem-safe, e.g. `20261018T093000`
    fn compact(&self) -> String {
        format!(
            "{:04}{:02}{:02}T{:02}{:02}{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }

    /// ISO 8601, e.g. `2026-10-18T09:30:00Z`
    fn iso(&self) -> String {
        format!(
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// Days since 1970-01-01 → (year, month, day), proleptic Gregorian.
///
/// Reference: <https://howardhinnant.github.io/date_algorithms.html#civil_from_days>
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);
    (
        year,
        u32::try_from(month).unwrap_or(1),
        u32::try_from(day).unwrap_or(1),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use routekit_core::{Endpoint, Method, TestConfig, TestResult};
    use serde_json::{Value, json};

    #[test]
    fn host_port_from_base_url() {
        assert_eq!(host_port("http://localhost:3000"), "localhost_3000");
        assert_eq!(host_port("https://api.example.com/v1"), "api.example.com");
        assert_eq!(host_port("http://10.0.0.1:8080?x=1"), "10.0.0.1_8080");
        assert_eq!(host_port(""), "unknown");
    }

    #[test]
    fn civil_dates() {
        assert_eq!(civil_from_days(0), (1970, 1, 1));
        assert_eq!(civil_from_days(20_489), (2026, 2, 5));
        assert_eq!(civil_from_days(-1), (1969, 12, 31));
        assert_eq!(civil_from_days(11_016), (2000, 2, 29));
    }

    #[test]
    fn stamp_formats() {
        // 2026-02-05T19:30:07Z
        let stamp = UtcStamp::from_epoch_secs(20_489 * 86_400 + 19 * 3600 + 30 * 60 + 7);
        assert_eq!(stamp.compact(), "20260205T193007");
        assert_eq!(stamp.iso(), "2026-02-05T19:30:07Z");
        assert_eq!(
            run_dir_name("http://localhost:3000", &stamp),
            "localhost_3000_20260205T193007"
        );
    }

    #[test]
    fn saves_summary_results_and_config() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config {
            test: TestConfig::new("http://localhost:4000").with_timeout_ms(250),
            ..Config::default()
        };
        let report = TestReport::new(vec![
            TestResult::passed(Endpoint::new(Method::Get, "/health"), 200, 3, json!({"ok": true})),
            TestResult::execution_failed(
                Endpoint::new(Method::Get, "/down"),
                250,
                "Request timed out after 250ms",
            ),
        ]);
        let record = RunRecord {
            config: &config,
            report: &report,
            endpoints_file: Path::new("endpoints.json"),
            duration_secs: 0.5,
        };

        let dir = save_report(&record, tmp.path()).unwrap();
        let name = dir.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("localhost_4000_"), "{name}");

        let summary: Value =
            serde_json::from_str(&std::fs::read_to_string(dir.join("summary.json")).unwrap())
                .unwrap();
        assert_eq!(summary["verdict"], "fail");
        assert_eq!(summary["summary"], json!({"total": 2, "passed": 1, "failed": 1}));
        assert_eq!(summary["meta"]["baseUrl"], "http://localhost:4000");

        let results: Vec<TestResult> =
            serde_json::from_str(&std::fs::read_to_string(dir.join("results.json")).unwrap())
                .unwrap();
        assert_eq!(results, report.results);

        let snapshot = Config::load(&dir.join("config.toml")).unwrap();
        assert_eq!(snapshot.test.timeout_ms(), 250);
        assert_eq!(snapshot.test.base_url, "http://localhost:4000");
    }
}
