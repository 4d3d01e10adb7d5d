//! `conan-makevars toolchain` command

use anyhow::Result;

use conan_makevars::builder::toolchain::ToolchainLocator;
use conan_makevars::core::platform::{host_arch, Platform};
use conan_makevars::ops::generate::host_provider;
use conan_makevars::util::config::load_for_workdir;
use conan_makevars::util::context::{conan_home, Environment, CC_VAR, CXX_VAR};
use conan_makevars::util::process::SystemRunner;

use crate::cli::ToolchainArgs;

pub fn execute(args: ToolchainArgs) -> Result<()> {
    let platform = Platform::host();
    let config = load_for_workdir(&args.workdir);
    let env = Environment::capture();
    let runner = SystemRunner;

    let provider = host_provider(platform, &runner, &env, &config);
    let mut locator = ToolchainLocator::new(provider.as_ref());
    let toolchain = locator.resolve(&env)?;

    println!("Toolchain:");
    println!();
    println!("  CC:       {}", toolchain.cc.display());
    println!("  CXX:      {}", toolchain.cxx.display());
    println!("  Version:  {}", toolchain.cc_major_version);
    println!();
    println!("  Platform: {}", platform);
    println!("  Arch:     {}", host_arch());

    if platform.uses_bundled_toolchain() {
        let search_path = provider.search_path()?;
        println!();
        println!("Search path:");
        for entry in search_path.split(platform.path_separator()).take(2) {
            println!("  {}", entry);
        }
    }

    println!();
    println!("Environment:");
    for var in [CC_VAR, CXX_VAR] {
        if let Some(value) = env.get_non_empty(var) {
            println!("  {}={}", var, value);
        }
    }
    println!("  CONAN_HOME={}", conan_home(&env).display());

    Ok(())
}
