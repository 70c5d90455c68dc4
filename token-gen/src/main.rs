use chrono::{DateTime, Utc};
use clap::Parser;

use campus_auth::services::auth::{TokenCodec, UserRole, Verification};

/// Issue an HS256 access token for local testing of the API and the /ws channel.
///
/// - Signs with the same secret the server reads from JWT_SECRET
/// - Outputs:
///   - access token (use as `Authorization: Bearer <token>`)
///   - subject / role / issued_at / expires_at
#[derive(Parser, Debug)]
#[command(name = "token-gen", version, about)]
struct Args {
    /// Subject (the user's email)
    #[arg(long)]
    subject: String,

    /// STUDENT / PROFESSOR / ADMIN
    #[arg(long, default_value = "STUDENT")]
    role: UserRole,

    /// Token lifetime in seconds
    #[arg(long, default_value_t = 86_400)]
    ttl_seconds: u64,

    /// HMAC secret (>= 32 bytes)
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    secret: String,

    /// Override iat (unix seconds). Default: now. Handy for minting expired tokens.
    #[arg(long)]
    iat: Option<i64>,

    /// Print only the token (no extra lines)
    #[arg(long, default_value_t = false)]
    quiet: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let codec = TokenCodec::new(args.secret.as_bytes(), args.ttl_seconds)?;

    let issued_at: DateTime<Utc> = match args.iat {
        Some(ts) => DateTime::from_timestamp(ts, 0).ok_or("iat out of range")?,
        None => Utc::now(),
    };
    let token = codec.issue_at(&args.subject, args.role, issued_at)?;

    if args.quiet {
        println!("{}", token);
        return Ok(());
    }

    // Read it back so the printed values are what the server will see.
    let (state, claims) = match codec.verify(&token) {
        Verification::Valid(claims) => ("valid", claims),
        Verification::Expired(claims) => ("expired", claims),
        Verification::Invalid => return Err("issued token failed verification".into()),
    };

    println!("token: {}", token);
    println!("subject: {}", claims.subject);
    println!("role: {}", claims.role);
    println!("issued_at: {}", claims.issued_at);
    println!("expires_at: {}", claims.expires_at);
    println!("state: {}", state);

    Ok(())
}
