#![allow(dead_code)]

use yearbook_store::{Database, Session, StoreConfig, UploadDraft};

pub const PIXEL: &str = "data:image/png;base64,iVBORw0KGgo=";

pub fn open() -> Database {
    Database::open_in_memory(StoreConfig::default()).expect("open store")
}

pub fn sign_up(db: &Database, name: &str) -> Session {
    let email = format!("{name}@example.com");
    db.register(name, &email, "secret1").expect("register");
    db.login(&email, "secret1").expect("login")
}

pub fn draft(school: &str, city: &str, country: &str, year: i32) -> UploadDraft {
    UploadDraft {
        school_name: school.into(),
        city: city.into(),
        country: country.into(),
        year,
        image_url: PIXEL.into(),
        ..UploadDraft::default()
    }
}
