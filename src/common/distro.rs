use std::fs;
use std::path::Path;

use crate::platform::PlatformFamily;

/// Represents a detected operating system with methods for family checks
/// and platform family selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatingSystem {
    /// Microsoft Windows
    Windows,
    /// Debian
    Debian,
    /// Ubuntu
    Ubuntu,
    /// Pop!_OS (Ubuntu-based)
    PopOS,
    /// Linux Mint (Ubuntu/Debian-based)
    LinuxMint,
    /// Raspberry Pi OS (Debian-based)
    Raspbian,
    /// Arch Linux
    Arch,
    /// Fedora
    Fedora,
    /// CentOS
    CentOS,
    /// AlmaLinux / Rocky Linux
    RockyLinux,
    /// OpenSUSE (including Leap and Tumbleweed)
    OpenSUSE,
    /// Unknown distribution with ID
    Unknown(String),
}

impl OperatingSystem {
    /// Detect the current operating system.
    ///
    /// Windows is decided by the compile target, Linux distributions by
    /// `/etc/os-release`.
    pub fn detect() -> Self {
        if cfg!(windows) {
            return Self::Windows;
        }

        let os_release_path = Path::new("/etc/os-release");
        if !os_release_path.exists() {
            return Self::Unknown("No /etc/os-release found".to_string());
        }

        match fs::read_to_string(os_release_path) {
            Ok(content) => Self::parse_os_release(&content),
            Err(_) => Self::Unknown("Failed to read /etc/os-release".to_string()),
        }
    }

    /// Parse os-release content and return the detected OS
    pub(crate) fn parse_os_release(content: &str) -> Self {
        let mut id = String::new();
        let mut id_like = String::new();

        for line in content.lines() {
            if let Some(val) = line.strip_prefix("ID=") {
                id = val.trim_matches('"').to_string();
            } else if let Some(val) = line.strip_prefix("ID_LIKE=") {
                id_like = val.trim_matches('"').to_string();
            }
        }

        match id.as_str() {
            "debian" => Self::Debian,
            "ubuntu" => Self::Ubuntu,
            "pop" => Self::PopOS,
            "linuxmint" => Self::LinuxMint,
            "raspbian" => Self::Raspbian,
            "arch" => Self::Arch,
            "fedora" => Self::Fedora,
            "centos" => Self::CentOS,
            "rocky" | "almalinux" => Self::RockyLinux,
            "opensuse" | "opensuse-leap" | "opensuse-tumbleweed" => Self::OpenSUSE,
            _ => {
                // For unknown IDs, check ID_LIKE for family detection
                if id_like.contains("ubuntu") {
                    Self::Ubuntu
                } else if id_like.contains("debian") {
                    Self::Debian
                } else if id_like.contains("arch") {
                    Self::Arch
                } else if id_like.contains("fedora") || id_like.contains("rhel") {
                    Self::Fedora
                } else {
                    Self::Unknown(id)
                }
            }
        }
    }

    /// Returns the parent OS that this distribution is based on.
    pub fn based_on(&self) -> Option<Self> {
        match self {
            Self::PopOS | Self::LinuxMint => Some(Self::Ubuntu),
            Self::Ubuntu | Self::Raspbian => Some(Self::Debian),
            Self::CentOS | Self::RockyLinux => Some(Self::Fedora),
            Self::Windows
            | Self::Debian
            | Self::Arch
            | Self::Fedora
            | Self::OpenSUSE
            | Self::Unknown(_) => None,
        }
    }

    pub fn is_windows(&self) -> bool {
        matches!(self, Self::Windows)
    }

    /// Check if this OS is Debian-based (uses apt)
    pub fn is_debian_based(&self) -> bool {
        *self == Self::Debian
            || self
                .based_on()
                .map(|p| p.is_debian_based())
                .unwrap_or(false)
    }

    /// The platform family whose package and service managers drive this OS.
    ///
    /// `None` means no manager variant exists for it yet.
    pub fn platform_family(&self) -> Option<PlatformFamily> {
        if self.is_windows() {
            Some(PlatformFamily::Windows)
        } else if self.is_debian_based() {
            Some(PlatformFamily::Debian)
        } else {
            None
        }
    }

    /// Get the display name of the operating system
    pub fn name(&self) -> &str {
        match self {
            Self::Windows => "Windows",
            Self::Debian => "Debian",
            Self::Ubuntu => "Ubuntu",
            Self::PopOS => "Pop!_OS",
            Self::LinuxMint => "Linux Mint",
            Self::Raspbian => "Raspberry Pi OS",
            Self::Arch => "Arch Linux",
            Self::Fedora => "Fedora",
            Self::CentOS => "CentOS",
            Self::RockyLinux => "Rocky Linux",
            Self::OpenSUSE => "openSUSE",
            Self::Unknown(_) => "Unknown",
        }
    }
}

impl std::fmt::Display for OperatingSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown(name) => write!(f, "Unknown ({})", name),
            _ => write!(f, "{}", self.name()),
        }
    }
}
