use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{bail, Result};

const CONFIG_SAMPLE: &str = r#"[server]
address = "0.0.0.0"
port = 8001
# Bodies carry base64 encoded images
max_body_bytes = 10485760

# backend is either "mongo" or "memory"
[storage]
backend = "mongo"
uri = "mongodb://127.0.0.1:27017"
database = "postdeck"

# Missing values are read from CLOUDINARY_CLOUD_NAME, CLOUDINARY_API_KEY
# and CLOUDINARY_API_SECRET
[media]
# cloud_name = "demo"
# api_key = "000000000000000"
# api_secret = "secret"

[auth]
user_header = "x-user-id"

[posts]
page_size = 10
enforce_ownership = false

# For the log location, if you want it to be relative to the executable directory
# use ${exe_dir}/location
[log]
level = "Info"
log_to_console = true
"#;

pub(crate) fn write_sample_cfg(file_path: &Path) -> Result<()> {
    if file_path.exists() {
        bail!("{} already exists", file_path.display());
    }
    let mut file = File::create(file_path)?;
    file.write_all(CONFIG_SAMPLE.as_bytes())?;
    Ok(())
}
