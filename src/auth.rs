use anyhow::{Result, bail};
use std::io::{self, BufRead, IsTerminal};
use zeroize::Zeroizing;

pub const PASSWORD_ENV: &str = "SEALFILE_PASSWORD";

/// Reads the password from, in order: `SEALFILE_PASSWORD`, piped stdin,
/// or an interactive prompt. `confirm` asks twice on a TTY.
pub fn read_password(confirm: bool) -> Result<Zeroizing<String>> {
    //  SEALFILE_PASSWORD="supersecret" sealfile decrypt notes.txt.enc
    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        if !pw.is_empty() {
            return Ok(Zeroizing::new(pw));
        }
    }

    //  printf "%s" "$PW" | sealfile encrypt notes.txt
    if !io::stdin().is_terminal() {
        let mut pw = Zeroizing::new(String::new());
        io::stdin().lock().read_line(&mut pw)?;
        trim_newline(&mut pw);

        if pw.is_empty() {
            bail!("No password provided");
        }
        return Ok(pw);
    }

    let pw = Zeroizing::new(rpassword::prompt_password("Password: ")?);
    if pw.is_empty() {
        bail!("password cannot be empty");
    }

    if confirm {
        let again = Zeroizing::new(rpassword::prompt_password("Confirm password: ")?);
        if *pw != *again {
            bail!("passwords do not match");
        }
    }

    Ok(pw)
}

fn trim_newline(s: &mut String) {
    while s.ends_with('\n') || s.ends_with('\r') {
        s.pop();
    }
}
