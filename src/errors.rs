use error_chain::error_chain;

error_chain! {
    foreign_links {
        Io(std::io::Error);
        SerdeError(serde_json::Error);
        Reqwest(reqwest::Error);
    }
}
