//! Command kind codes (§6).

/// The command kinds this crate recognizes, with the numeric codes the wire format uses.
///
/// Codes outside this table are not an error by default (§7 `UnknownCommand` only fires in
/// strict mode); [`Kind::Unknown`] carries the raw code through so a diagnostic can name it.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, strum::AsRefStr, serde::Serialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CommandKind {
    Subvol,
    Snapshot,
    Mkfile,
    Mkdir,
    Mknod,
    Mkfifo,
    Mksock,
    Symlink,
    Rename,
    Link,
    Unlink,
    Rmdir,
    SetXattr,
    RemoveXattr,
    Write,
    Clone,
    Truncate,
    Chmod,
    Chown,
    Utimes,
    End,
    UpdateExtent,
}

impl CommandKind {
    pub const fn code(self) -> u16 {
        match self {
            Self::Subvol => 1,
            Self::Snapshot => 2,
            Self::Mkfile => 3,
            Self::Mkdir => 4,
            Self::Mknod => 5,
            Self::Mkfifo => 6,
            Self::Mksock => 7,
            Self::Symlink => 8,
            Self::Rename => 9,
            Self::Link => 10,
            Self::Unlink => 11,
            Self::Rmdir => 12,
            Self::SetXattr => 13,
            Self::RemoveXattr => 14,
            Self::Write => 15,
            Self::Clone => 16,
            Self::Truncate => 17,
            Self::Chmod => 18,
            Self::Chown => 19,
            Self::Utimes => 20,
            Self::End => 21,
            Self::UpdateExtent => 22,
        }
    }

    pub const fn from_code(code: u16) -> Option<Self> {
        Some(match code {
            1 => Self::Subvol,
            2 => Self::Snapshot,
            3 => Self::Mkfile,
            4 => Self::Mkdir,
            5 => Self::Mknod,
            6 => Self::Mkfifo,
            7 => Self::Mksock,
            8 => Self::Symlink,
            9 => Self::Rename,
            10 => Self::Link,
            11 => Self::Unlink,
            12 => Self::Rmdir,
            13 => Self::SetXattr,
            14 => Self::RemoveXattr,
            15 => Self::Write,
            16 => Self::Clone,
            17 => Self::Truncate,
            18 => Self::Chmod,
            19 => Self::Chown,
            20 => Self::Utimes,
            21 => Self::End,
            22 => Self::UpdateExtent,
            _ => return None,
        })
    }
}

/// A decoded command kind: either one of the known [`CommandKind`]s, or a code the table
/// doesn't have an entry for (§7 `UnknownCommand`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Kind {
    Known(CommandKind),
    Unknown(u16),
}

impl Kind {
    pub(crate) fn from_code(code: u16) -> Self {
        match CommandKind::from_code(code) {
            Some(known) => Self::Known(known),
            None => Self::Unknown(code),
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Known(kind) => write!(f, "{}", kind.as_ref()),
            Self::Unknown(code) => write!(f, "unknown({code})"),
        }
    }
}
