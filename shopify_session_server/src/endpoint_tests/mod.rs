mod exchange;
mod helpers;
mod mocks;
mod session;
