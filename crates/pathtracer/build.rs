use std::io;
use std::process::{Command, Output};

fn main() -> io::Result<()> {
    // Tell the build script to only run again if we change our source shaders
    println!("cargo:rerun-if-changed=shaders");

    std::fs::create_dir_all("../../spv")?;

    for entry in std::fs::read_dir("shaders")? {
        let entry = entry?;

        if entry.file_type()?.is_file() {
            let in_path = entry.path();
            let path_str = in_path.to_str().unwrap();
            let result = Command::new("glslc")
                .args([path_str, "--target-env=vulkan1.3", "-o"])
                .arg(&format!(
                    "../../spv/{}.spv",
                    entry.file_name().into_string().unwrap()
                ))
                .output();

            handle_program_result(result);
        }
    }

    Ok(())
}

fn handle_program_result(result: io::Result<Output>) {
    match result {
        Ok(output) if output.status.success() => {
            println!("Shader compilation succeeded.");
        }
        Ok(output) => {
            eprint!("stdout: {}", String::from_utf8_lossy(&output.stdout));
            eprint!("stderr: {}", String::from_utf8_lossy(&output.stderr));
            panic!("Shader compilation failed. Status: {}", output.status);
        }
        // without glslc installed, a previously compiled spv is used as-is
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            println!("cargo:warning=glslc not found, skipping shader compilation");
        }
        Err(error) => {
            panic!("Failed to compile shader. Cause: {error}");
        }
    }
}
