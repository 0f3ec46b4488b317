#![no_main]
use libfuzzer_sys::fuzz_target;

const SUBCOMMANDS: [&str; 5] = ["create", "apply", "inspect", "size", "config"];

fuzz_target!(|data: &[u8]| {
    let Some((&sel, rest)) = data.split_first() else {
        return;
    };

    // Lead with a real subcommand most of the time so flag parsing is reached.
    let mut args = Vec::<String>::new();
    if let Some(cmd) = SUBCOMMANDS.get(usize::from(sel % 8)) {
        args.push((*cmd).to_string());
    }
    let text = String::from_utf8_lossy(rest);
    args.extend(text.split_whitespace().take(32).map(str::to_string));

    bitdelta::cli::fuzz_try_parse_args(&args);
});
