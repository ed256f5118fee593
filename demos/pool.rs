#[macro_use]
extern crate log;

#[cfg(target_family = "unix")]
use argh::FromArgs;
#[cfg(target_family = "unix")]
use smb_pool::{ops, SmbAuthentication, SmbPath, SmbPool, SmbcFactory, UserCredentials};

#[cfg(target_family = "unix")]
#[derive(FromArgs)]
#[argh(description = "
where positional is an UNC path: \\\\server[:port]\\share[\\path\\to\\dir]

List the files in a remote SMB directory through a pooled connection.")]
struct Args {
    #[argh(option, short = 'u', description = "specify username")]
    username: Option<String>,
    #[argh(option, short = 'P', description = "specify password")]
    password: Option<String>,
    #[argh(
        option,
        short = 'w',
        default = r#""WORKGROUP".to_string()"#,
        description = "specify workgroup"
    )]
    workgroup: String,
    #[argh(positional, description = "UNC path of the directory to list")]
    path: String,
}

#[cfg(target_family = "unix")]
fn main() -> anyhow::Result<()> {
    assert!(env_logger::builder().try_init().is_ok());
    let args: Args = argh::from_env();
    let dir = SmbPath::parse(&args.path)?;
    let authentication = match &args.username {
        Some(username) => {
            let password = match &args.password {
                Some(p) => p.clone(),
                None => read_secret_from_tty("Password: ")?,
            };
            SmbAuthentication::User(
                UserCredentials::default()
                    .username(username)
                    .password(password)
                    .domain(&args.workgroup),
            )
        }
        None => SmbAuthentication::Anonymous,
    };

    let pool = SmbPool::new(Box::new(SmbcFactory)).with_authentication(authentication);
    pool.start();

    info!("connecting to {}...", dir);
    let connector = pool.get_or_create(&dir)?;
    info!("connected");
    let share = connector.share().expect("connector is connected");

    info!("listing files at {}", dir);
    for file in ops::list_dir(share.as_ref(), &dir, None)? {
        println!("{}", file.name());
    }

    info!("stopping pool...");
    pool.stop();
    info!("pool stopped");

    Ok(())
}

#[cfg(target_family = "unix")]
fn read_secret_from_tty(prompt: &str) -> std::io::Result<String> {
    rpassword::prompt_password(prompt)
}

#[cfg(not(target_family = "unix"))]
fn main() -> anyhow::Result<()> {
    anyhow::bail!("the pool demo requires a unix target");
}
