use std::fs;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let rev = fs::read_to_string("../../abi/oracle/REVISION")?;
    println!("cargo::rustc-env=ORACLE_REVISION={rev}");
    Ok(())
}
