//! 专业/方向/班级推导
//!
//! 成绩页只给出一段原始的专业文本（如 "B TECH IN CIVIL ENGINEERING"），
//! 这里把它归一化成导出表需要的 Program / Branch / Section 字段

use phf::phf_map;

/// 无法识别时的占位
pub const UNKNOWN: &str = "Unknown";

/// 专业文本（小写）→ 方向缩写
///
/// "mngineering" 是门户页面上的原始拼写，保持一致才能命中
static BRANCHES: phf::Map<&'static str, &'static str> = phf_map! {
    "b tech in artificial intelligence and machine learning" => "AIML",
    "b tech in artificial intelligence" => "AI",
    "b tech in computer science and engineering" => "CSE",
    "b tech in electronics and communication engineering" => "ECE",
    "b tech in mechanical mngineering" => "ME",
    "b tech in civil engineering" => "CE",
};

/// 从原始专业文本推导 Program
pub fn program_from(raw_program: &str) -> String {
    if raw_program.contains("B TECH") {
        "B Tech".to_string()
    } else {
        UNKNOWN.to_string()
    }
}

/// 从原始专业文本查找方向（不区分大小写）
pub fn branch_from(raw_program: &str) -> String {
    BRANCHES
        .get(raw_program.trim().to_lowercase().as_str())
        .copied()
        .unwrap_or(UNKNOWN)
        .to_string()
}

/// 班级取准考证号倒数第 3 个字符
pub fn section_from(hall_ticket_number: &str) -> String {
    let chars: Vec<char> = hall_ticket_number.chars().collect();
    if chars.len() >= 3 {
        chars[chars.len() - 3].to_string()
    } else {
        UNKNOWN.to_string()
    }
}
