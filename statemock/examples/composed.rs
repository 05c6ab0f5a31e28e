// vim: tw=80
//! Mock a type that is composed of other mocked types
//!
//! A `Session` owns a `Socket`, and both are mocked by hand.  The socket mock
//! shares its state with the session mock, so an expectation on the socket
//! can require a state entered by a call on the session.
#![deny(warnings)]

use std::sync::Arc;

use statemock::*;

pub trait Socket {
    fn send(&self, data: &[u8]) -> usize;
}

pub trait Session {
    fn login(&self, user: &str) -> bool;
    fn socket(&self) -> &dyn Socket;
}

pub struct MockSocket {
    ctrl: Controller,
    send: Arc<Method<(Vec<u8>,), usize>>,
}

impl MockSocket {
    pub fn new() -> Result<Self, Error> {
        let mut ctrl = Controller::new();
        let send = ctrl.method("MockSocket::send", signature!(&[u8]))?;
        Ok(MockSocket { ctrl, send })
    }
}

impl Socket for MockSocket {
    fn send(&self, data: &[u8]) -> usize {
        self.send.call((data.to_vec(),))
    }
}

pub struct MockSession {
    ctrl: Controller,
    login: Arc<Method<(String,), bool>>,
    socket: MockSocket,
}

impl MockSession {
    pub fn new() -> Result<Self, Error> {
        let mut ctrl = Controller::new();
        let login = ctrl.method("MockSession::login", signature!(&str))?;
        let socket = MockSocket::new()?;
        socket.ctrl.share_state_with(&ctrl)?;
        Ok(MockSession { ctrl, login, socket })
    }

    /// Violations of the session and of its socket
    pub fn verify(&self) -> Vec<Violation> {
        let mut v = self.ctrl.verify_all();
        v.extend(self.socket.ctrl.verify_all());
        v
    }
}

impl Session for MockSession {
    fn login(&self, user: &str) -> bool {
        self.login.call((user.to_owned(),))
    }

    fn socket(&self) -> &dyn Socket {
        &self.socket
    }
}

/// The code under test
fn greet(session: &dyn Session, user: &str) -> Option<usize> {
    if session.login(user) {
        Some(session.socket().send(b"hello"))
    } else {
        None
    }
}

fn main() -> Result<(), Error> {
    let session = MockSession::new()?;
    session.login.expect()
        .with(predicate::eq(("alice".to_owned(),)))
        .postcondition("authenticated")
        .return_const(true);
    session.socket.send.expect()
        .precondition("authenticated")
        .returning(|(data,)| data.len());

    println!("sent {:?} bytes", greet(&session, "alice"));
    match report(&session.verify()) {
        Some(r) => println!("{}", r),
        None => println!("all expectations satisfied")
    }
    Ok(())
}
