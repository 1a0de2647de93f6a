//! Desktop integration: the system clipboard and the default browser.
//!
//! Copying goes through `arboard` first. The handle is kept alive for the
//! whole session because on X11/Wayland the owning process has to stay around
//! for the selection to remain pasteable. When `arboard` cannot start (no
//! display, sandboxed session) or refuses the write, the native command line
//! tools are tried in order.

use std::fmt;
use std::io::Write;
use std::process::{Command, Stdio};

use log::{debug, info, warn};
use reqwest::Url;

#[derive(Debug)]
pub enum DesktopError {
    /// Neither arboard nor any native tool accepted the text.
    ClipboardUnavailable,
    /// Only http(s) links are handed to the browser.
    UnsupportedUrl(String),
    Browser(std::io::Error),
}

impl fmt::Display for DesktopError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DesktopError::ClipboardUnavailable => write!(f, "clipboard unavailable"),
            DesktopError::UnsupportedUrl(url) => write!(f, "refusing to open non-web link: {}", url),
            DesktopError::Browser(e) => write!(f, "could not launch browser: {}", e),
        }
    }
}

impl std::error::Error for DesktopError {}

/// The two things the chat screen asks of the desktop.
pub trait Desktop {
    fn copy(&mut self, text: &str) -> Result<(), DesktopError>;
    fn open(&mut self, url: &str) -> Result<(), DesktopError>;
}

/// The real desktop: system clipboard plus the default browser.
#[derive(Default)]
pub struct SystemDesktop {
    clipboard: Clipboard,
}

impl SystemDesktop {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Desktop for SystemDesktop {
    fn copy(&mut self, text: &str) -> Result<(), DesktopError> {
        self.clipboard.copy(text)
    }

    fn open(&mut self, url: &str) -> Result<(), DesktopError> {
        open_url(url)
    }
}

pub struct Clipboard {
    native: Option<arboard::Clipboard>,
}

impl Default for Clipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Clipboard {
    pub fn new() -> Self {
        let native = match arboard::Clipboard::new() {
            Ok(clipboard) => Some(clipboard),
            Err(e) => {
                info!("arboard unavailable, will use command line tools: {}", e);
                None
            }
        };
        Self { native }
    }

    /// Put `text` on the system clipboard.
    pub fn copy(&mut self, text: &str) -> Result<(), DesktopError> {
        if let Some(clipboard) = self.native.as_mut() {
            match clipboard.set_text(text) {
                Ok(()) => {
                    debug!("Copied {} bytes via arboard", text.len());
                    return Ok(());
                }
                Err(e) => warn!("arboard copy failed, trying command line tools: {}", e),
            }
        }

        for (program, args) in fallback_tools(is_wayland()) {
            if pipe_to(program, args, text) {
                debug!("Copied {} bytes via {}", text.len(), program);
                return Ok(());
            }
        }
        Err(DesktopError::ClipboardUnavailable)
    }
}

fn is_wayland() -> bool {
    std::env::var("XDG_SESSION_TYPE")
        .map(|s| s == "wayland")
        .unwrap_or(false)
        || std::env::var("WAYLAND_DISPLAY").is_ok()
}

type Tool = (&'static str, &'static [&'static str]);

const WL_COPY: Tool = ("wl-copy", &[]);
const XCLIP: Tool = ("xclip", &["-selection", "clipboard"]);
const XSEL: Tool = ("xsel", &["--clipboard", "--input"]);
const PBCOPY: Tool = ("pbcopy", &[]);
const CLIP: Tool = ("clip", &[]);

/// Clipboard commands for this platform, in preference order.
fn fallback_tools(wayland: bool) -> Vec<Tool> {
    if cfg!(target_os = "macos") {
        vec![PBCOPY]
    } else if cfg!(target_os = "windows") {
        vec![CLIP]
    } else if wayland {
        vec![WL_COPY, XCLIP, XSEL]
    } else {
        vec![XCLIP, XSEL]
    }
}

/// Spawn `program`, write `text` to its stdin and reap it on a helper thread.
fn pipe_to(program: &str, args: &[&str], text: &str) -> bool {
    let Ok(mut child) = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    else {
        return false;
    };
    let Some(mut stdin) = child.stdin.take() else {
        let _ = child.kill();
        return false;
    };
    if stdin.write_all(text.as_bytes()).is_err() {
        let _ = child.kill();
        return false;
    }
    // Closing stdin signals EOF
    drop(stdin);
    std::thread::spawn(move || {
        let _ = child.wait();
    });
    true
}

/// Parses `url` and accepts it only if it is an http(s) link.
fn web_url(url: &str) -> Result<Url, DesktopError> {
    let parsed = Url::parse(url).map_err(|_| DesktopError::UnsupportedUrl(url.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(DesktopError::UnsupportedUrl(url.to_string()));
    }
    Ok(parsed)
}

/// Open `url` in the user's default browser.
pub fn open_url(url: &str) -> Result<(), DesktopError> {
    let parsed = web_url(url)?;
    info!("Opening {} in browser", parsed);
    webbrowser::open(parsed.as_str()).map_err(DesktopError::Browser)
}
