//! Mask builder

use super::mask::{BasicPermission, PermissionMask};
use crate::errors::{Result, WardError};

const OFF: char = '.';
const ON: char = '*';

/// Accumulates permission bits by name or by mask
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaskBuilder {
    mask: PermissionMask,
}

impl MaskBuilder {
    /// Start from an empty mask
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing mask
    pub fn with_mask(mask: PermissionMask) -> Self {
        Self { mask }
    }

    /// Bit of a single named permission
    pub fn mask_for(permission: &str) -> Result<PermissionMask> {
        BasicPermission::from_name(permission)
            .map(BasicPermission::mask)
            .ok_or_else(|| WardError::unknown_permission(permission))
    }

    /// Set the bit of a named permission
    pub fn add(&mut self, permission: &str) -> Result<&mut Self> {
        self.mask |= Self::mask_for(permission)?;
        Ok(self)
    }

    /// Set raw bits
    pub fn add_mask(&mut self, mask: PermissionMask) -> &mut Self {
        self.mask |= mask;
        self
    }

    /// Clear the bit of a named permission
    pub fn remove(&mut self, permission: &str) -> Result<&mut Self> {
        self.mask &= !Self::mask_for(permission)?;
        Ok(self)
    }

    /// Clear raw bits
    pub fn remove_mask(&mut self, mask: PermissionMask) -> &mut Self {
        self.mask &= !mask;
        self
    }

    /// Current mask
    pub fn get(&self) -> PermissionMask {
        self.mask
    }

    /// Clear every bit
    pub fn reset(&mut self) -> &mut Self {
        self.mask = PermissionMask::EMPTY;
        self
    }

    /// Human-readable 32-character pattern, most significant bit first
    pub fn pattern(&self) -> String {
        (0..32)
            .rev()
            .map(|bit| {
                let single = PermissionMask::from_bits(1 << bit);
                if !self.mask.intersects(single) {
                    OFF
                } else {
                    BasicPermission::from_mask(single).map_or(ON, BasicPermission::code)
                }
            })
            .collect()
    }

    /// Pattern code for a single-bit mask
    pub fn code_for(mask: PermissionMask) -> Result<char> {
        if mask.bits().count_ones() != 1 {
            return Err(WardError::invalid(format!(
                "code_for expects a single bit, got {mask}"
            )));
        }
        Ok(BasicPermission::from_mask(mask).map_or(ON, BasicPermission::code))
    }
}
