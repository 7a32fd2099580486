//! Permission mask bit values

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};

/// Unsigned 32-bit permission mask
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PermissionMask(u32);

impl PermissionMask {
    /// No permission bits
    pub const EMPTY: Self = Self(0);
    /// View the object
    pub const VIEW: Self = Self(1);
    /// Create objects
    pub const CREATE: Self = Self(1 << 1);
    /// Edit the object
    pub const EDIT: Self = Self(1 << 2);
    /// Delete the object
    pub const DELETE: Self = Self(1 << 3);
    /// Restore a deleted object
    pub const UNDELETE: Self = Self(1 << 4);
    /// View, edit, create, delete and undelete
    pub const OPERATOR: Self = Self(1 << 5);
    /// Operator plus granting the above to others
    pub const MASTER: Self = Self(1 << 6);
    /// Master plus granting master to others
    pub const OWNER: Self = Self(1 << 7);
    /// Every bit a mask builder can set
    pub const IDDQD: Self = Self(1_073_741_823);

    /// Wrap raw bits
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw bits
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether no bit is set
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether any bit is shared with `other`
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Whether every bit of `other` is set in `self`
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl From<u32> for PermissionMask {
    fn from(bits: u32) -> Self {
        Self(bits)
    }
}

impl BitOr for PermissionMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for PermissionMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for PermissionMask {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl BitAndAssign for PermissionMask {
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

impl Not for PermissionMask {
    type Output = Self;

    fn not(self) -> Self {
        Self(!self.0)
    }
}

impl fmt::Display for PermissionMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// The named basic permissions with their pattern codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BasicPermission {
    /// See [`PermissionMask::VIEW`]
    View,
    /// See [`PermissionMask::CREATE`]
    Create,
    /// See [`PermissionMask::EDIT`]
    Edit,
    /// See [`PermissionMask::DELETE`]
    Delete,
    /// See [`PermissionMask::UNDELETE`]
    Undelete,
    /// See [`PermissionMask::OPERATOR`]
    Operator,
    /// See [`PermissionMask::MASTER`]
    Master,
    /// See [`PermissionMask::OWNER`]
    Owner,
}

impl BasicPermission {
    /// All basic permissions in bit order
    pub const ALL: [BasicPermission; 8] = [
        Self::View,
        Self::Create,
        Self::Edit,
        Self::Delete,
        Self::Undelete,
        Self::Operator,
        Self::Master,
        Self::Owner,
    ];

    /// Canonical upper-case name
    pub const fn name(self) -> &'static str {
        match self {
            Self::View => "VIEW",
            Self::Create => "CREATE",
            Self::Edit => "EDIT",
            Self::Delete => "DELETE",
            Self::Undelete => "UNDELETE",
            Self::Operator => "OPERATOR",
            Self::Master => "MASTER",
            Self::Owner => "OWNER",
        }
    }

    /// Single-letter code used in mask patterns
    pub const fn code(self) -> char {
        match self {
            Self::View => 'V',
            Self::Create => 'C',
            Self::Edit => 'E',
            Self::Delete => 'D',
            Self::Undelete => 'U',
            Self::Operator => 'O',
            Self::Master => 'M',
            Self::Owner => 'N',
        }
    }

    /// Bit of this permission
    pub const fn mask(self) -> PermissionMask {
        match self {
            Self::View => PermissionMask::VIEW,
            Self::Create => PermissionMask::CREATE,
            Self::Edit => PermissionMask::EDIT,
            Self::Delete => PermissionMask::DELETE,
            Self::Undelete => PermissionMask::UNDELETE,
            Self::Operator => PermissionMask::OPERATOR,
            Self::Master => PermissionMask::MASTER,
            Self::Owner => PermissionMask::OWNER,
        }
    }

    /// Look up a permission by name, ignoring case
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|permission| permission.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Look up the permission owning exactly this bit
    pub fn from_mask(mask: PermissionMask) -> Option<Self> {
        Self::ALL.into_iter().find(|permission| permission.mask() == mask)
    }
}
