use std::path::PathBuf;

pub fn fixture_path(name: &str) -> PathBuf {
    let mut path =
        PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set"));
    path.push("tests/fixtures");
    path.push(name);
    path
}

pub fn read_fixture(name: &str) -> String {
    let fpath = fixture_path(name);
    std::fs::read_to_string(&fpath).unwrap_or_else(|_| panic!("{fpath:?} to exist"))
}
