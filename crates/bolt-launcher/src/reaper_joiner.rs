use std::process::Child;
use std::sync::{mpsc, OnceLock};
use std::thread;
use std::time::{Duration, Instant};

const POLL_TICK: Duration = Duration::from_millis(500);

/// A launched game the joiner still owes a `wait` to.
struct Tracked {
    child: Child,
    program: String,
    started: Instant,
}

static GAMES: OnceLock<mpsc::Sender<Tracked>> = OnceLock::new();

/// Hands a launched game to the background joiner so its exit status is
/// collected. Never blocks the caller.
pub fn register(child: Child, program: String) {
    let tracked = Tracked {
        child,
        program,
        started: Instant::now(),
    };
    let tx = GAMES.get_or_init(|| {
        let (tx, rx) = mpsc::channel();
        let _ = thread::Builder::new()
            .name("bolt-launcher-reaper".to_string())
            .spawn(move || run(rx));
        tx
    });
    if let Err(mpsc::SendError(tracked)) = tx.send(tracked) {
        wait_on_own_thread(tracked);
    }
}

fn run(rx: mpsc::Receiver<Tracked>) {
    let mut games: Vec<Tracked> = Vec::new();
    loop {
        match rx.recv_timeout(POLL_TICK) {
            Ok(game) => games.push(game),
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) if games.is_empty() => return,
            Err(mpsc::RecvTimeoutError::Disconnected) => thread::sleep(POLL_TICK),
        }
        games.retain_mut(still_running);
    }
}

/// Polls one game; `false` once it has been reaped or is no longer ours.
fn still_running(game: &mut Tracked) -> bool {
    match game.child.try_wait() {
        Ok(None) => true,
        Ok(Some(status)) => {
            tracing::debug!(
                pid = game.child.id(),
                program = %game.program,
                uptime_secs = game.started.elapsed().as_secs(),
                %status,
                "game process exited"
            );
            false
        }
        #[cfg(unix)]
        Err(err) if err.raw_os_error() == Some(libc::ECHILD) => false,
        Err(err) => {
            tracing::debug!(pid = game.child.id(), error = %err, "try_wait failed");
            true
        }
    }
}

fn wait_on_own_thread(mut game: Tracked) {
    let _ = thread::Builder::new()
        .name("bolt-launcher-wait".to_string())
        .spawn(move || {
            let _ = game.child.wait();
        });
}
