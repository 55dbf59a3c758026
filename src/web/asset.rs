use actix_files as fs;
use actix_web::{error, get, Error, HttpRequest};
use std::path::{Component, PathBuf};

pub const ASSET_DIR: &str = "public/assets/";

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_file);
}

/// Resolves a request path below the asset directory. Paths escaping it are refused.
pub fn asset_path(filename: &str) -> Option<PathBuf> {
    let req_path = PathBuf::from(filename);
    if filename.is_empty()
        || req_path
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
    {
        return None;
    }
    let mut path = PathBuf::from(ASSET_DIR);
    path.push(req_path);
    Some(path)
}

#[get("/assets/{filename:.*}")]
async fn view_file(req: HttpRequest) -> Result<fs::NamedFile, Error> {
    let path = asset_path(req.match_info().query("filename"))
        .ok_or_else(|| error::ErrorNotFound("Asset not found."))?;
    let file = fs::NamedFile::open(path)?;

    Ok(file.use_last_modified(true))
}
