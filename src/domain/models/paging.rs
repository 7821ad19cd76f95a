/// Skip/limit window over a record list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Paging {
    pub skip: usize,
    pub limit: usize,
}

impl Default for Paging {
    fn default() -> Paging {
        return Paging { skip: 0, limit: 10 };
    }
}

impl Paging {
    pub fn to_params(&self) -> Vec<(String, String)> {
        return vec![
            ("skip".to_string(), self.skip.to_string()),
            ("limit".to_string(), self.limit.to_string()),
        ];
    }
}
