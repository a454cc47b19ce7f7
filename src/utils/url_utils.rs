// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use url::{ParseError, Url};

/// 将可能为相对路径的URL转换为绝对路径URL
pub fn resolve_url(base_url: &Url, path: &str) -> Result<Url, ParseError> {
    base_url.join(path)
}

/// 规范化职位URL
///
/// 在第一个 `?` 处截断，去掉查询字符串。同一职位在不同请求中会携带不同的
/// 跟踪参数，截断后它们收敛到同一个去重键。
///
/// 该函数是幂等的：`normalize_job_url(normalize_job_url(u)) == normalize_job_url(u)`
pub fn normalize_job_url(url: &str) -> &str {
    match url.find('?') {
        Some(pos) => &url[..pos],
        None => url,
    }
}
