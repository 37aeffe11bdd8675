//! Browser process management.
//!
//! One session per process: either a browser launched with remote debugging
//! enabled, or a bare connection to an already running page target.

use super::cdp::CdpClient;
use domlogic_core::{BrowserConfig, Error, Paths, Result};
use serde_json::Value;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tracing::{debug, info};

/// Supported browser engines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BrowserEngine {
    Chrome,
    Edge,
    Firefox,
}

impl BrowserEngine {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "firefox" | "ff" => Self::Firefox,
            "edge" | "msedge" => Self::Edge,
            _ => Self::Chrome,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Chrome => "chrome",
            Self::Edge => "edge",
            Self::Firefox => "firefox",
        }
    }
}

/// The active browser session: its CDP client and, when launched by us, the process.
pub struct BrowserSession {
    pub cdp: CdpClient,
    /// Page target WebSocket URL.
    pub ws_url: String,
    /// `None` when attached to a browser we did not start.
    browser_process: Option<Child>,
}

impl BrowserSession {
    /// Launch a browser according to `config` and connect to its first page target.
    pub async fn launch(config: &BrowserConfig, paths: &Paths) -> Result<Self> {
        let engine = BrowserEngine::parse(&config.engine);
        let browser_path = find_browser_binary(engine)
            .ok_or_else(|| Error::Session(format!("{} not found. Please install it.", engine.name())))?;

        let user_data_dir = match &config.user_data_dir {
            Some(dir) => PathBuf::from(dir),
            None => paths.session_profile("default"),
        };
        std::fs::create_dir_all(&user_data_dir)?;

        let debug_port = find_free_port().await?;
        let args = build_browser_args(engine, debug_port, &user_data_dir, config.headed);

        info!(
            port = debug_port,
            headed = config.headed,
            browser = engine.name(),
            "Launching browser"
        );

        let child = Command::new(&browser_path)
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Session(format!("Failed to launch {}: {}", engine.name(), e)))?;

        wait_for_cdp_ready(debug_port, config.startup_timeout_secs).await?;
        let page_ws_url = get_page_ws_url(debug_port).await?;

        let mut session =
            Self::connect(&page_ws_url, Duration::from_secs(config.command_timeout_secs)).await?;
        session.browser_process = Some(child);
        Ok(session)
    }

    /// Attach to an existing page target.
    pub async fn attach(ws_url: &str, command_timeout: Duration) -> Result<Self> {
        info!(ws_url = %ws_url, "Attaching to page target");
        Self::connect(ws_url, command_timeout).await
    }

    async fn connect(ws_url: &str, command_timeout: Duration) -> Result<Self> {
        let cdp = CdpClient::connect(ws_url, command_timeout)
            .await
            .map_err(|e| Error::Session(e.to_string()))?;

        for domain in ["Page", "Runtime", "DOM"] {
            cdp.enable_domain(domain)
                .await
                .map_err(|e| Error::Session(e.to_string()))?;
        }

        info!(ws_url = %ws_url, "CDP connection established (page target)");

        Ok(Self {
            cdp,
            ws_url: ws_url.to_string(),
            browser_process: None,
        })
    }

    /// Close the browser if we launched it.
    pub async fn close(&mut self) {
        if let Some(mut child) = self.browser_process.take() {
            if let Err(e) = self.cdp.close_browser().await {
                debug!("CDP Browser.close failed (may already be closed): {}", e);
            }
            let _ = child.kill().await;
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if let Some(child) = self.browser_process.as_mut() {
            let _ = child.start_kill();
        }
    }
}

/// Build browser-specific command line arguments.
fn build_browser_args(
    engine: BrowserEngine,
    debug_port: u16,
    user_data_dir: &std::path::Path,
    headed: bool,
) -> Vec<String> {
    match engine {
        BrowserEngine::Firefox => {
            let mut args = vec![
                "--remote-debugging-port".to_string(),
                debug_port.to_string(),
                "--profile".to_string(),
                user_data_dir.display().to_string(),
                "--no-remote".to_string(),
            ];
            if !headed {
                args.push("--headless".to_string());
            }
            args.push("about:blank".to_string());
            args
        }
        BrowserEngine::Chrome | BrowserEngine::Edge => {
            let mut args = vec![
                format!("--remote-debugging-port={}", debug_port),
                format!("--user-data-dir={}", user_data_dir.display()),
                "--no-first-run".to_string(),
                "--no-default-browser-check".to_string(),
                "--disable-background-networking".to_string(),
                "--disable-extensions".to_string(),
                "--disable-sync".to_string(),
                "--disable-translate".to_string(),
                "--password-store=basic".to_string(),
            ];
            if !headed {
                args.push("--headless=new".to_string());
            }
            args.push("--window-size=1280,720".to_string());
            args.push("about:blank".to_string());
            args
        }
    }
}

/// Find a browser binary on the system for the given engine.
pub fn find_browser_binary(engine: BrowserEngine) -> Option<String> {
    let candidates = match engine {
        BrowserEngine::Chrome => {
            if cfg!(target_os = "macos") {
                vec![
                    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
                    "/Applications/Chromium.app/Contents/MacOS/Chromium",
                ]
            } else if cfg!(target_os = "linux") {
                vec![
                    "google-chrome", "google-chrome-stable",
                    "chromium", "chromium-browser",
                    "/usr/bin/google-chrome", "/usr/bin/chromium",
                ]
            } else {
                vec![
                    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
                    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
                ]
            }
        }
        BrowserEngine::Edge => {
            if cfg!(target_os = "macos") {
                vec!["/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge"]
            } else if cfg!(target_os = "linux") {
                vec!["microsoft-edge", "microsoft-edge-stable", "/usr/bin/microsoft-edge"]
            } else {
                vec![r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe"]
            }
        }
        BrowserEngine::Firefox => {
            if cfg!(target_os = "macos") {
                vec!["/Applications/Firefox.app/Contents/MacOS/firefox"]
            } else if cfg!(target_os = "linux") {
                vec!["firefox", "/usr/bin/firefox"]
            } else {
                vec![r"C:\Program Files\Mozilla Firefox\firefox.exe"]
            }
        }
    };

    for candidate in candidates {
        if std::path::Path::new(candidate).exists() {
            return Some(candidate.to_string());
        }
        if !candidate.contains('/') && !candidate.contains('\\') && which::which(candidate).is_ok() {
            return Some(candidate.to_string());
        }
    }
    None
}

/// List all available browser engines on the system.
pub fn list_available_browsers() -> Vec<(BrowserEngine, String)> {
    let mut result = Vec::new();
    for engine in [BrowserEngine::Chrome, BrowserEngine::Edge, BrowserEngine::Firefox] {
        if let Some(path) = find_browser_binary(engine) {
            result.push((engine, path));
        }
    }
    result
}

async fn find_free_port() -> Result<u16> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    drop(listener);
    Ok(port)
}

/// Polls /json/version until the debugging endpoint answers, up to `timeout_secs`.
async fn wait_for_cdp_ready(port: u16, timeout_secs: u64) -> Result<String> {
    let start = std::time::Instant::now();
    let timeout = Duration::from_secs(timeout_secs);
    let url = format!("http://127.0.0.1:{}/json/version", port);

    loop {
        if start.elapsed() > timeout {
            return Err(Error::Session(format!(
                "CDP not ready after {}s on port {}",
                timeout_secs, port
            )));
        }

        if let Ok(resp) = reqwest::get(&url).await {
            if let Ok(body) = resp.json::<Value>().await {
                if let Some(ws_url) = body.get("webSocketDebuggerUrl").and_then(|v| v.as_str()) {
                    return Ok(ws_url.to_string());
                }
            }
        }

        tokio::time::sleep(Duration::from_millis(200)).await;
    }
}

/// Find the first page target's WebSocket URL via /json/list.
/// Retries a few times since the page target may not appear immediately.
pub async fn get_page_ws_url(port: u16) -> Result<String> {
    let url = format!("http://127.0.0.1:{}/json/list", port);

    for attempt in 0..10 {
        if attempt > 0 {
            tokio::time::sleep(Duration::from_millis(300)).await;
        }

        let resp = match reqwest::get(&url).await {
            Ok(r) => r,
            Err(_) => continue,
        };
        let targets: Vec<Value> = match resp.json().await {
            Ok(t) => t,
            Err(_) => continue,
        };

        if let Some(ws_url) = first_page_ws_url(&targets) {
            return Ok(ws_url);
        }
    }

    Err(Error::Session("No page target found after retries".to_string()))
}

fn first_page_ws_url(targets: &[Value]) -> Option<String> {
    targets
        .iter()
        .filter(|t| t.get("type").and_then(|v| v.as_str()) == Some("page"))
        .find_map(|t| t.get("webSocketDebuggerUrl").and_then(|v| v.as_str()))
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_engine_parse() {
        assert_eq!(BrowserEngine::parse("FF"), BrowserEngine::Firefox);
        assert_eq!(BrowserEngine::parse("msedge"), BrowserEngine::Edge);
        assert_eq!(BrowserEngine::parse("anything"), BrowserEngine::Chrome);
    }

    #[test]
    fn test_headless_args() {
        let dir = std::path::Path::new("/tmp/profile");
        let args = build_browser_args(BrowserEngine::Chrome, 9222, dir, false);
        assert!(args.contains(&"--remote-debugging-port=9222".to_string()));
        assert!(args.contains(&"--headless=new".to_string()));
        let headed = build_browser_args(BrowserEngine::Firefox, 9222, dir, true);
        assert!(!headed.contains(&"--headless".to_string()));
    }

    #[test]
    fn test_first_page_target() {
        let targets = vec![
            json!({"type": "service_worker", "webSocketDebuggerUrl": "ws://sw"}),
            json!({"type": "page", "webSocketDebuggerUrl": "ws://page"}),
        ];
        assert_eq!(first_page_ws_url(&targets).as_deref(), Some("ws://page"));
        assert_eq!(first_page_ws_url(&[]), None);
    }
}
