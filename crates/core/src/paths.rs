use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Paths {
    pub base: PathBuf,
}

impl Paths {
    pub fn new() -> Self {
        let base = dirs::home_dir()
            .map(|h| h.join(".domlogic"))
            .unwrap_or_else(|| PathBuf::from(".domlogic"));
        Self { base }
    }

    pub fn with_base(base: PathBuf) -> Self {
        Self { base }
    }

    pub fn config_file(&self) -> PathBuf {
        self.base.join("config.json")
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.base.join("sessions")
    }

    /// Browser profile directory for a named session.
    pub fn session_profile(&self, session_name: &str) -> PathBuf {
        let safe_name = session_name.replace([':', '/', '\\'], "_");
        self.sessions_dir().join(safe_name)
    }
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}
