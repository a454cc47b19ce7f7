// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use jobwatch::domain::models::posting::Region;
use jobwatch::domain::services::geography_classifier::classify;
use jobwatch::utils::url_utils::normalize_job_url;

/// 分类对任意输入都给出唯一标签
#[test]
fn classification_is_total() {
    let inputs = [
        "",
        "   ",
        "Unknown",
        "UNKNOWN",
        "Remote",
        "Greater Toronto Area, Canada",
        "Mumbai, Maharashtra, India",
        "New York, NY, United States",
        "Remote - USA",
        "Berlin, Germany",
        "東京都, 日本",
        "🙂",
        "canada india",
    ];
    for input in inputs {
        let region = classify(input);
        assert_eq!(classify(input), region, "classification of {input:?} is unstable");
    }

    assert_eq!(classify("   "), Region::Unknown);
    assert_eq!(classify("Berlin, Germany"), Region::Other);
    // 先匹配者优先
    assert_eq!(classify("canada india"), Region::Canada);
}

#[test]
fn normalization_strips_only_query_and_is_idempotent() {
    let urls = [
        "https://x/y?z=1",
        "https://x/y",
        "https://x/y?",
        "https://x/y?a=1?b=2",
        "https://x/y#frag",
        "?only-query",
        "",
    ];
    for url in urls {
        let once = normalize_job_url(url);
        assert_eq!(normalize_job_url(once), once);
        assert!(!once.contains('?'));
        assert!(url.starts_with(once));
    }
    assert_eq!(normalize_job_url("https://x/y?a=1?b=2"), "https://x/y");
    assert_eq!(normalize_job_url("https://x/y#frag"), "https://x/y#frag");
}
