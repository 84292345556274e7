use once_cell::sync::Lazy;
use prometheus::{register_int_counter, Encoder, IntCounter, TextEncoder};

// Prometheus metrics (default registry)
pub static CONTACTS_CREATED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("contact_book_contacts_created_total", "Total contacts created")
        .expect("register contacts_created_total")
});

pub static CONTACTS_UPDATED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("contact_book_contacts_updated_total", "Total contacts updated")
        .expect("register contacts_updated_total")
});

pub static CONTACTS_DELETED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("contact_book_contacts_deleted_total", "Total contacts deleted")
        .expect("register contacts_deleted_total")
});

pub static IMAGE_UPLOADS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("contact_book_image_uploads_total", "Total contact photos uploaded")
        .expect("register image_uploads_total")
});

pub static IMAGE_UPLOAD_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "contact_book_image_upload_failures_total",
        "Total contact photo uploads that failed"
    )
    .expect("register image_upload_failures_total")
});

pub static EXPORTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("contact_book_exports_total", "Total CSV exports served")
        .expect("register exports_total")
});

/// Touch every counter so they show up on `/metrics` before the first event.
pub fn init() {
    for counter in [
        &CONTACTS_CREATED_TOTAL,
        &CONTACTS_UPDATED_TOTAL,
        &CONTACTS_DELETED_TOTAL,
        &IMAGE_UPLOADS_TOTAL,
        &IMAGE_UPLOAD_FAILURES_TOTAL,
        &EXPORTS_TOTAL,
    ] {
        Lazy::force(counter);
    }
}

pub fn encode_metrics() -> (axum::http::StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {e}"),
        );
    }
    (
        axum::http::StatusCode::OK,
        String::from_utf8(buffer).unwrap_or_default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_are_exposed() {
        init();
        EXPORTS_TOTAL.inc();
        let (status, body) = encode_metrics();
        assert_eq!(status, axum::http::StatusCode::OK);
        assert!(body.contains("contact_book_exports_total"));
        assert!(body.contains("contact_book_contacts_created_total"));
    }
}
