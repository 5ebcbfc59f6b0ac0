//! Generates signed attribution request URLs for manual testing.
//!
//! Each printed URL carries a freshly encoded attribution payload (with a
//! current timestamp) and its HMAC signature, ready to be thrown at a
//! running service instance.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use clap::Parser;
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};
use stub_attribution::attribution::{query_escape, QueryValues};

#[derive(Parser)]
#[command(name = "stubtestclient")]
#[command(about = "Generate signed stub attribution request URLs")]
#[command(version)]
struct Cli {
    /// Base stub attribution service URL
    #[arg(long, default_value = "http://127.0.0.1:8000/")]
    baseurl: String,

    #[arg(long, default_value = "testcampaign")]
    campaign: String,

    #[arg(long, default_value = "testcontent")]
    content: String,

    #[arg(long, default_value = "testmedium")]
    medium: String,

    #[arg(long, default_value = "mozilla.com")]
    source: String,

    #[arg(long, default_value = "exp1")]
    experiment: String,

    #[arg(long, default_value = "var1")]
    variation: String,

    #[arg(long, default_value = "full")]
    installer_type: String,

    #[arg(long, default_value = "en-US")]
    lang: String,

    #[arg(long, default_value = "win")]
    os: String,

    #[arg(long, default_value = "test-stub")]
    product: String,

    /// HMAC key matching the service's HMAC_KEY
    #[arg(long, env = "HMAC_KEY", default_value = "testkey")]
    hmackey: String,

    /// Append a random campaign suffix and emit this many URLs
    #[arg(long, default_value_t = 1)]
    numurls: usize,
}

fn random_string(length: usize) -> String {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

fn gen_code(cli: &Cli, campaign: &str) -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_secs();

    let mut query = QueryValues::new();
    query.set("campaign", campaign);
    query.set("content", &cli.content);
    query.set("medium", &cli.medium);
    query.set("source", &cli.source);
    query.set("experiment", &cli.experiment);
    query.set("installer_type", &cli.installer_type);
    query.set("variation", &cli.variation);
    query.set("timestamp", &timestamp.to_string());

    URL_SAFE.encode(query.encode()).replace('=', ".")
}

fn hmac_sig(key: &str, code: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(key.as_bytes()).expect("hmac accepts any key");
    mac.update(code.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

fn gen_url(cli: &Cli, code: &str, sig: &str) -> String {
    let mut query = QueryValues::new();
    query.set("attribution_code", code);
    query.set("attribution_sig", sig);
    query.set("lang", &cli.lang);
    query.set("os", &cli.os);
    query.set("product", &cli.product);
    format!("{}?{}", cli.baseurl, query.encode())
}

fn main() {
    let cli = Cli::parse();

    for i in 0..cli.numurls {
        let campaign = if i == 0 {
            cli.campaign.clone()
        } else {
            format!("{}{}", cli.campaign, random_string(12))
        };
        let code = gen_code(&cli, &campaign);
        let sig = hmac_sig(&cli.hmackey, &query_escape(&code));
        println!("{}", gen_url(&cli, &code, &sig));
    }
}
