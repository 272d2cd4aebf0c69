use super::{City, CityDirectory};

fn copenhagen() -> City {
    City {
        uuid: "7b6e9a1c-3f2d-4e8b-9c5a-0d1e2f3a4b5c".to_string(),
        name: "Copenhagen".to_string(),
        country: "Denmark".to_string(),
        latitude: 55.6761,
        longitude: 12.5683,
    }
}

#[test]
fn resolve_known_city() {
    let directory = CityDirectory::new();
    directory.insert(copenhagen());

    let city = directory.resolve("7b6e9a1c-3f2d-4e8b-9c5a-0d1e2f3a4b5c").unwrap();
    assert_eq!(city.name, "Copenhagen");
    assert_eq!(city.country, "Denmark");
}

#[test]
fn resolve_unknown_city_returns_none() {
    let directory = CityDirectory::new();
    assert!(directory.resolve("no-such-uuid").is_none());
}

#[test]
fn from_json_file_loads_all_entries() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("cities.json");
    let json = r#"[
        {"uuid": "a", "name": "Copenhagen", "country": "Denmark", "latitude": 55.6761, "longitude": 12.5683},
        {"uuid": "b", "name": "Tokyo", "country": "Japan", "latitude": 35.6762, "longitude": 139.6503}
    ]"#;
    std::fs::write(&path, json).unwrap();

    let directory = CityDirectory::from_json_file(&path).unwrap();
    assert_eq!(directory.len(), 2);
    assert_eq!(directory.resolve("b").unwrap().name, "Tokyo");
}

#[test]
fn from_json_file_rejects_invalid_json() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("cities.json");
    std::fs::write(&path, "not json").unwrap();

    assert!(CityDirectory::from_json_file(&path).is_err());
}
