//! Binary asset fetching and the cubemap directory source.

use anyhow::{Context, Result};

use crate::{data_structures::texture::CubeTexture, world::CubemapSource};

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> Result<reqwest::Url> {
    let window = web_sys::window().context("no window object")?;
    let origin = window
        .location()
        .origin()
        .ok()
        .context("no window origin")?;
    let base = reqwest::Url::parse(&format!("{}/assets/", origin))?;
    Ok(base.join(file_name)?)
}

/// Fetch the raw bytes of an asset file, resolved under the `assets`
/// directory (served over HTTP on wasm).
pub async fn load_binary(file_name: &str) -> Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(file_name)?;
        reqwest::get(url).await?.bytes().await?.to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let path = std::path::Path::new("./").join("assets").join(file_name);
        std::fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?
    };

    Ok(data)
}

/// Cubemap source that fetches the six faces from an environment directory,
/// for example `envmap/<name>/px.png`. All faces are fetched concurrently;
/// any failure fails the whole cubemap so no partial backdrop is installed.
#[derive(Clone, Debug)]
pub struct CubemapDirSource {
    base_dir: String,
}

impl CubemapDirSource {
    pub fn new(base_dir: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }
}

impl Default for CubemapDirSource {
    fn default() -> Self {
        Self::new("envmap")
    }
}

impl CubemapSource for CubemapDirSource {
    async fn fetch_cubemap(&self, faces: &[String; 6]) -> Result<CubeTexture> {
        let paths: Vec<String> = faces
            .iter()
            .map(|face| format!("{}/{}", self.base_dir, face))
            .collect();
        let results = futures::future::join_all(paths.iter().map(|path| load_binary(path))).await;

        let mut face_bytes = Vec::with_capacity(6);
        for (path, result) in paths.iter().zip(results) {
            face_bytes
                .push(result.with_context(|| format!("failed to fetch cubemap face {path}"))?);
        }
        let face_bytes: [Vec<u8>; 6] = face_bytes
            .try_into()
            .expect("exactly six faces were fetched above");

        let name = faces[0]
            .rsplit_once('/')
            .map(|(dir, _)| dir)
            .unwrap_or("environment");
        CubeTexture::from_face_bytes(name, &face_bytes)
    }
}
