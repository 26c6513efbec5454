#![allow(dead_code)]

use phisheye_classifiers::data_handling::RawDataset;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn headers() -> Vec<String> {
    vec!["url_length".into(), "has_ip".into(), "status".into()]
}

/// Row `i` of the synthetic phishing table: long URLs and raw IP hosts are phishing.
pub fn row(i: usize) -> Vec<String> {
    let url_length = 20 + (i * 37) % 80;
    let has_ip = if i % 4 == 0 { "yes" } else { "no" };
    let status = if url_length > 60 || has_ip == "yes" {
        "phish"
    } else {
        "legit"
    };
    vec![url_length.to_string(), has_ip.to_string(), status.to_string()]
}

pub fn phishing_dataset(n: usize) -> RawDataset {
    RawDataset::from_string_rows(headers(), (0..n).map(row).collect())
}

/// The same table without the `status` column, columns in a different order.
pub fn unlabeled_dataset(n: usize) -> RawDataset {
    let rows = (0..n)
        .map(|i| {
            let r = row(i);
            vec![r[1].clone(), r[0].clone()]
        })
        .collect();
    RawDataset::from_string_rows(vec!["has_ip".into(), "url_length".into()], rows)
}
