//! Keyboard event intrinsics (`keyboard` class).
//!
//! A background thread owns the terminal in raw mode and feeds normalized
//! key names into a channel. Key names are plain strings and cross the
//! thread boundary; listener callbacks are VM values and stay on the VM
//! thread in thread-local storage. `listen` polls non-blocking and queues
//! matching callbacks on the host; the session runs them after the current
//! statement.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::BufRead;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::time::Duration;

use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal;
use once_cell::sync::Lazy;
use sqd_core::builtins::Host;
use sqd_core::val::Val;

use crate::wrong_args;

struct Listener {
    keys: Vec<String>,
    callback: Val,
}

thread_local! {
    static LISTENERS: RefCell<HashMap<String, Listener>> = RefCell::new(HashMap::new());
}

struct EventPipe {
    sender: Sender<String>,
    receiver: Receiver<String>,
}

static EVENTS: Lazy<Mutex<EventPipe>> = Lazy::new(|| {
    let (sender, receiver) = channel();
    Mutex::new(EventPipe { sender, receiver })
});
static READER_ACTIVE: AtomicBool = AtomicBool::new(false);
static LISTENER_SEQ: AtomicUsize = AtomicUsize::new(0);

fn normalize_key(event: &KeyEvent) -> Option<String> {
    let base = match event.code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_uppercase().to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Escape".to_string(),
        KeyCode::Backspace => "Backspace".to_string(),
        KeyCode::Up => "Up".to_string(),
        KeyCode::Down => "Down".to_string(),
        KeyCode::Left => "Left".to_string(),
        KeyCode::Right => "Right".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        _ => return None,
    };
    if event.modifiers.contains(KeyModifiers::CONTROL) {
        Some(format!("KeyCtrl+{}", base))
    } else {
        Some(format!("Key{}", base))
    }
}

fn start_reader() {
    if READER_ACTIVE.swap(true, Ordering::SeqCst) {
        return;
    }
    let sender = EVENTS.lock().expect("event pipe poisoned").sender.clone();
    std::thread::spawn(move || {
        while READER_ACTIVE.load(Ordering::SeqCst) {
            match crossterm::event::poll(Duration::from_millis(50)) {
                Ok(true) => {
                    if let Ok(Event::Key(key)) = crossterm::event::read() {
                        if let Some(name) = normalize_key(&key) {
                            // Drop events nobody is draining rather than block.
                            let _ = sender.send(name);
                        }
                    }
                }
                Ok(false) => {}
                Err(_) => std::thread::sleep(Duration::from_millis(50)),
            }
        }
    });
}

fn stop_reader() {
    READER_ACTIVE.store(false, Ordering::SeqCst);
    let _ = terminal::disable_raw_mode();
}

fn matches_listener(key: &str, keys: &[String]) -> bool {
    keys.iter().any(|k| k == key)
}

/// Registers a callback for one or more keys and starts the background
/// reader. Returns the listener id.
pub fn on(args: &[Val], _host: &mut Host) -> Val {
    if args.len() < 2 {
        return wrong_args("at least 2", args.len());
    }

    let mut keys = Vec::new();
    for (i, arg) in args[..args.len() - 1].iter().enumerate() {
        let Val::Str(key) = arg else {
            return Val::error(format!(
                "Argument {} to `keyboard.on` must be STRING, got {}",
                i,
                arg.type_name()
            ));
        };
        keys.push(key.to_string());
    }

    let callback = args[args.len() - 1].clone();
    if !matches!(callback, Val::Closure(_) | Val::Function(_) | Val::Str(_)) {
        return Val::error(format!(
            "Last argument to `keyboard.on` must be FUNCTION or STRING, got {}",
            callback.type_name()
        ));
    }

    let id = format!("listener_{}", LISTENER_SEQ.fetch_add(1, Ordering::SeqCst));
    LISTENERS.with(|listeners| {
        listeners.borrow_mut().insert(id.clone(), Listener { keys, callback });
    });

    if let Err(e) = terminal::enable_raw_mode() {
        return Val::error(format!("Failed to enable keyboard listening: {}", e));
    }
    start_reader();
    Val::string(id)
}

/// Blocks until a key arrives. Falls back to line input when stdin is not
/// a terminal.
pub fn read(args: &[Val], _host: &mut Host) -> Val {
    if !args.is_empty() {
        return wrong_args("0", args.len());
    }

    if READER_ACTIVE.load(Ordering::SeqCst) {
        let events = EVENTS.lock().expect("event pipe poisoned");
        return match events.receiver.recv() {
            Ok(key) => Val::string(key),
            Err(e) => Val::error(format!("Failed to read key: {}", e)),
        };
    }

    if !terminal::is_raw_mode_enabled().unwrap_or(false) && terminal::enable_raw_mode().is_err() {
        // Not a terminal: take the first character of a line instead.
        let mut line = String::new();
        if let Err(e) = std::io::stdin().lock().read_line(&mut line) {
            return Val::error(format!("Failed to read input: {}", e));
        }
        let line = line.trim();
        return match line.chars().next() {
            Some(c) => Val::string(format!("Key{}", c.to_uppercase())),
            None => Val::string("KeyEnter"),
        };
    }

    let result = loop {
        match crossterm::event::read() {
            Ok(Event::Key(key)) => {
                if let Some(name) = normalize_key(&key) {
                    break Val::string(name);
                }
            }
            Ok(_) => {}
            Err(e) => break Val::error(format!("Failed to read key: {}", e)),
        }
    };
    let _ = terminal::disable_raw_mode();
    result
}

/// Non-blocking poll: returns the next key name or null, and queues the
/// callbacks of matching listeners for the session to invoke.
pub fn listen(args: &[Val], host: &mut Host) -> Val {
    if !args.is_empty() {
        return wrong_args("0", args.len());
    }

    let _ = terminal::enable_raw_mode();
    start_reader();

    let key = {
        let events = EVENTS.lock().expect("event pipe poisoned");
        events.receiver.try_recv().ok()
    };
    let Some(key) = key else {
        return Val::Null;
    };

    LISTENERS.with(|listeners| {
        for listener in listeners.borrow().values() {
            if matches_listener(&key, &listener.keys) {
                host.pending_handlers.push(listener.callback.clone());
            }
        }
    });
    Val::string(key)
}

pub fn stop(args: &[Val], _host: &mut Host) -> Val {
    if !args.is_empty() {
        return wrong_args("0", args.len());
    }
    stop_reader();
    Val::Null
}

/// Unregisters a listener by id; true when it existed.
pub fn off(args: &[Val], _host: &mut Host) -> Val {
    if args.len() != 1 {
        return wrong_args("1", args.len());
    }
    let Val::Str(id) = &args[0] else {
        return Val::error(format!(
            "Argument 0 to `keyboard.off` must be STRING, got {}",
            args[0].type_name()
        ));
    };
    let removed = LISTENERS.with(|listeners| listeners.borrow_mut().remove(id.as_ref()).is_some());
    Val::Bool(removed)
}
