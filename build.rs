use std::env;

fn main() {
    // Emits `Py_3_X`, `Py_LIMITED_API`, `PyPy` etc. for the interpreter found via `PYO3_PYTHON`.
    pyo3_build_config::use_pyo3_cfgs();

    let config = pyo3_build_config::get();
    if env::var_os("CARGO_FEATURE_AUTO_INITIALIZE").is_some() && !config.shared {
        eprintln!(
            "error: the `auto-initialize` feature is enabled, but your python installation only supports \
             embedding the Python interpreter statically"
        );
        std::process::exit(1);
    }
}
