// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 列表页解析模块
pub mod posting_extractor;

pub use posting_extractor::{Extraction, ExtractorError, PostingExtractor, SelectorConfig};
