use std::{env, str::FromStr, time::Instant};

use stackswap::{Fiber, Stack, STRATEGY};
use tracing::{info, info_span, warn};
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, EnvFilter, Layer, Registry};

struct Config {
	iters: u64,
	stack: usize,
}

impl Config {
	fn from_env() -> Self {
		Self {
			iters: var("SWAP_ITERS", 1_000_000),
			stack: var("SWAP_STACK", Stack::DEFAULT_SIZE),
		}
	}
}

fn var<T: FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
	match env::var(name) {
		Ok(value) => match value.parse() {
			Ok(x) => x,
			Err(_) => {
				warn!("ignoring {name}={value:?}, using {default}");
				default
			},
		},
		Err(_) => default,
	}
}

struct Rally {
	main: Fiber,
	ping: Fiber,
	pong: Fiber,
	left: u64,
}

unsafe extern "C" fn ping(arg: *mut u8) {
	let rally = arg.cast::<Rally>();
	loop {
		let next = if (*rally).left == 0 { &raw const (*rally).main } else { &raw const (*rally).pong };
		(*rally).left = (*rally).left.saturating_sub(1);
		Fiber::switch(&raw mut (*rally).ping, next);
	}
}

unsafe extern "C" fn pong(arg: *mut u8) {
	let rally = arg.cast::<Rally>();
	loop {
		let next = if (*rally).left == 0 { &raw const (*rally).main } else { &raw const (*rally).ping };
		(*rally).left = (*rally).left.saturating_sub(1);
		Fiber::switch(&raw mut (*rally).pong, next);
	}
}

fn main() -> stackswap::Result<()> {
	let _ = tracing::subscriber::set_global_default(
		Registry::default().with(
			tracing_subscriber::fmt::layer()
				.with_span_events(FmtSpan::CLOSE)
				.with_filter(EnvFilter::from_env("SWAPLOG")),
		),
	);

	let config = Config::from_env();
	info!(
		"{} switches on {} byte stacks using the {:?} strategy",
		config.iters, config.stack, STRATEGY
	);

	let mut rally = Box::new(Rally {
		main: Fiber::native(),
		ping: Fiber::native(),
		pong: Fiber::native(),
		left: config.iters,
	});
	let r = &raw mut *rally;
	unsafe {
		(*r).ping = Fiber::with_stack(Stack::new(config.stack)?, ping, r.cast());
		(*r).pong = Fiber::with_stack(Stack::new(config.stack)?, pong, r.cast());
	}

	let elapsed = {
		let _span = info_span!("rally").entered();
		let start = Instant::now();
		unsafe {
			Fiber::switch(&raw mut (*r).main, &raw const (*r).ping);
		}
		start.elapsed()
	};

	let switches = config.iters + 2;
	info!(
		"{switches} switches in {elapsed:?}, {:.1} ns per switch",
		elapsed.as_nanos() as f64 / switches as f64
	);
	Ok(())
}
