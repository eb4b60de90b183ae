//! Group types

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_PAGE_NUMBER, DEFAULT_PAGE_SIZE};

/// A group as reported by Grouper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDescriptor {
    /// Fully qualified name, e.g. `RTGID:app:Deploy:admins`
    pub name: String,
    pub display_name: String,
    pub uuid: String,
    /// Last path segment of `name`
    pub extension: String,
}

/// Paging for stem queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// 1-based page number
    pub number: u32,
    pub size: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self { number: DEFAULT_PAGE_NUMBER, size: DEFAULT_PAGE_SIZE }
    }
}
