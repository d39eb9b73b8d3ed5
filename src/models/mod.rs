// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

// Re-export model modules
pub mod conversion;
pub mod exchange_rates;
pub mod health;
pub mod series;

pub use conversion::*;
pub use exchange_rates::{RateTable, BASE_CURRENCY};
pub use health::*;
pub use series::*;
