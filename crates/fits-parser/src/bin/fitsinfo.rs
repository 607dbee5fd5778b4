use fits_parser::header::{keywords, Header};
use fits_parser::stats::Geometry;
use fits_parser::{load, save, ParsedFile};
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const USAGE: &str = "Usage: fitsinfo [-v] [-o <out.fits>] <file.fits | url>\n\n\
Print the header summary of a single-HDU FITS file, optionally re-saving it.";

#[derive(Debug)]
struct Args {
    verbose: bool,
    location: String,
    output: Option<String>,
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut verbose = false;
    let mut location = None;
    let mut output = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "-v" || arg == "--verbose" {
            verbose = true;
        } else if arg == "-o" || arg == "--output" {
            let path = iter
                .next()
                .ok_or_else(|| format!("Missing path after {}", arg))?;
            output = Some(path.clone());
        } else if arg.starts_with('-') {
            return Err(format!("Unknown option: {}", arg));
        } else {
            if location.is_some() {
                return Err("Too many arguments".to_string());
            }
            location = Some(arg.clone());
        }
    }

    let location = location.ok_or_else(|| USAGE.to_string())?;
    Ok(Args {
        verbose,
        location,
        output,
    })
}

fn format_summary(header: &Header) -> String {
    let mut out = String::new();
    out.push_str(&format!("Entries: {}\n", header.len()));
    match Geometry::from_header(header) {
        Ok(g) => {
            out.push_str(&format!("  BITPIX: {}\n", g.bitpix.value()));
            out.push_str(&format!("  Dimensions: {} x {}\n", g.naxis1, g.naxis2));
            if let Ok(bytes) = g.data_bytes() {
                out.push_str(&format!("  Data size: {} bytes\n", bytes));
            }
        }
        Err(e) => out.push_str(&format!("  Geometry: {}\n", e)),
    }
    for keyword in [keywords::BSCALE, keywords::BZERO] {
        if let Some(v) = header.float(keyword) {
            out.push_str(&format!("  {}: {}\n", keyword, v));
        }
    }
    match (
        header.float(keywords::DATAMIN),
        header.float(keywords::DATAMAX),
    ) {
        (Some(min), Some(max)) => out.push_str(&format!("  Physical range: [{}, {}]\n", min, max)),
        _ => out.push_str("  Physical range: undefined\n"),
    }
    out
}

fn format_verbose_entries(header: &Header) -> String {
    let mut out = String::new();
    out.push_str("  Header entries:\n");
    for entry in header {
        match (&entry.value, &entry.comment) {
            (Some(val), Some(comment)) => {
                out.push_str(&format!("    {} = {} / {}\n", entry.keyword, val, comment));
            }
            (Some(val), None) => {
                out.push_str(&format!("    {} = {}\n", entry.keyword, val));
            }
            (None, Some(text)) => {
                out.push_str(&format!("    {} {}\n", entry.keyword, text));
            }
            (None, None) => {
                if !entry.keyword.is_empty() {
                    out.push_str(&format!("    {}\n", entry.keyword));
                }
            }
        }
    }
    out
}

fn format_file_info(file: &ParsedFile, verbose: bool) -> String {
    let mut out = format_summary(file.header());
    if verbose {
        out.push_str(&format_verbose_entries(file.header()));
    }
    out
}

async fn run(args: &[String]) -> Result<String, String> {
    let args = parse_args(args)?;

    let file = load(&args.location)
        .await
        .ok_or_else(|| format!("Error loading '{}'", args.location))?;

    let mut out = format_file_info(&file, args.verbose);

    if let Some(path) = &args.output {
        save(&file, path)
            .await
            .map_err(|e| format!("Error writing '{}': {}", path, e))?;
        out.push_str(&format!("Saved to {}\n", path));
    }

    Ok(out)
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr);

    if let Err(e) = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
    {
        eprintln!("Logger initialization failed: {}", e);
    }
}

#[tokio::main]
async fn main() {
    setup_logging();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args).await {
        Ok(output) => print!("{}", output),
        Err(msg) => {
            eprintln!("{}", msg);
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fits_parser::header::HeaderEntry;
    use fits_parser::writer::serialize_header;
    use fits_parser::Value;

    fn image_header(bitpix: i64, naxis1: i64, naxis2: i64) -> Header {
        Header::from(vec![
            HeaderEntry::new(keywords::SIMPLE, Value::Logical(true)),
            HeaderEntry::new(keywords::BITPIX, Value::Integer(bitpix)),
            HeaderEntry::new(keywords::NAXIS, Value::Integer(2)),
            HeaderEntry::new(keywords::NAXIS1, Value::Integer(naxis1)),
            HeaderEntry::new(keywords::NAXIS2, Value::Integer(naxis2)),
        ])
    }

    fn build_fits_bytes(header: &Header, payload: &[u8]) -> Vec<u8> {
        let mut bytes = serialize_header(header).unwrap();
        bytes.extend_from_slice(payload);
        bytes
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn summary_shows_geometry_and_range() {
        let mut h = image_header(16, 1024, 1024);
        h.push(HeaderEntry::new(keywords::DATAMIN, Value::Float(-3.0)));
        h.push(HeaderEntry::new(keywords::DATAMAX, Value::Float(12.5)));
        let output = format_summary(&h);

        assert!(output.contains("Entries: 7"));
        assert!(output.contains("BITPIX: 16"));
        assert!(output.contains("Dimensions: 1024 x 1024"));
        assert!(output.contains("Data size: 2097152 bytes"));
        assert!(output.contains("Physical range: [-3, 12.5]"));
    }

    #[test]
    fn summary_without_range() {
        let output = format_summary(&image_header(8, 2, 2));
        assert!(output.contains("Physical range: undefined"));
    }

    #[test]
    fn summary_reports_missing_geometry() {
        let output = format_summary(&Header::new());
        assert!(output.contains("Geometry: missing required keyword: BITPIX"));
    }

    #[test]
    fn verbose_shows_header_entries() {
        let mut h = image_header(8, 2, 2);
        h.push(HeaderEntry::commentary(keywords::HISTORY, "resampled"));
        let output = format_verbose_entries(&h);

        assert!(output.contains("Header entries:"));
        assert!(output.contains("SIMPLE = T"));
        assert!(output.contains("NAXIS1 = 2"));
        assert!(output.contains("HISTORY resampled"));
    }

    #[test]
    fn parse_args_no_args() {
        let result = parse_args(&[]);
        assert!(result.unwrap_err().contains("Usage:"));
    }

    #[test]
    fn parse_args_unknown_option() {
        let result = parse_args(&args(&["--foo"]));
        assert!(result.unwrap_err().contains("Unknown option"));
    }

    #[test]
    fn parse_args_too_many() {
        let result = parse_args(&args(&["a.fits", "b.fits"]));
        assert!(result.unwrap_err().contains("Too many arguments"));
    }

    #[test]
    fn parse_args_output_needs_path() {
        let result = parse_args(&args(&["a.fits", "-o"]));
        assert!(result.unwrap_err().contains("Missing path"));
    }

    #[test]
    fn parse_args_all_options() {
        let parsed = parse_args(&args(&["-v", "a.fits", "--output", "b.fits"])).unwrap();
        assert!(parsed.verbose);
        assert_eq!(parsed.location, "a.fits");
        assert_eq!(parsed.output.as_deref(), Some("b.fits"));
    }

    #[tokio::test]
    async fn run_missing_file() {
        let result = run(&args(&["nonexistent.fits"])).await;
        assert!(result.unwrap_err().contains("Error loading"));
    }

    #[tokio::test]
    async fn run_with_temp_file_and_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.fits");
        let output = dir.path().join("out.fits");
        std::fs::write(&input, build_fits_bytes(&image_header(8, 4, 1), &[2, 9, 4, 1])).unwrap();

        let result = run(&args(&[
            "-v",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ]))
        .await
        .unwrap();

        assert!(result.contains("Dimensions: 4 x 1"));
        assert!(result.contains("Physical range: [1, 9]"));
        assert!(result.contains("DATAMAX = 9.0"));
        assert!(result.contains("Saved to"));

        let written = std::fs::read(&output).unwrap();
        assert_eq!(written.len() % fits_parser::BLOCK_SIZE, 0);
    }
}
