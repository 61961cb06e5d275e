//! SVG-style track geometry. Supports absolute `M`, `L` and `Q` commands,
//! which is what the corridor drawings use.

use regex::Regex;
use serde::Serialize;

const QUAD_SAMPLES: usize = 32;

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Fail, PartialEq)]
pub enum PathError {
    #[fail(display = "error in regular expression: {}", _0)]
    RegexError(String),
    #[fail(display = "path must start with a move-to command")]
    NoMoveTo,
    #[fail(display = "unsupported path command '{}'", _0)]
    UnsupportedCommand(char),
    #[fail(display = "missing coordinate for command '{}'", _0)]
    MissingCoordinate(char),
    #[fail(display = "unexpected text in path: {}", _0)]
    Unexpected(String),
}

/// Track drawing flattened to a polyline, with cumulative arc lengths.
#[derive(Clone, Debug)]
pub struct PathGeometry {
    pub source: String,
    points: Vec<Point>,
    dist: Vec<f64>,
}

#[derive(Debug, PartialEq)]
enum Token {
    Command(char),
    Number(f64),
}

fn tokenize(d: &str) -> Result<Vec<Token>, PathError> {
    let re = Regex::new(r"[A-Za-z]|[-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?")
        .map_err(|e| PathError::RegexError(format!("{:?}", e)))?;
    let mut tokens = Vec::new();
    let mut last = 0;
    for m in re.find_iter(d) {
        let gap = &d[last..m.start()];
        if gap.chars().any(|c| !c.is_whitespace() && c != ',') {
            return Err(PathError::Unexpected(gap.trim().to_string()));
        }
        last = m.end();
        let s = m.as_str();
        match s.parse::<f64>() {
            Ok(x) => tokens.push(Token::Number(x)),
            Err(_) => tokens.push(Token::Command(s.chars().next().unwrap_or('?'))),
        }
    }
    let rest = &d[last..];
    if rest.chars().any(|c| !c.is_whitespace() && c != ',') {
        return Err(PathError::Unexpected(rest.trim().to_string()));
    }
    Ok(tokens)
}

fn quad(p0: Point, c: Point, p1: Point, t: f64) -> Point {
    let u = 1.0 - t;
    Point {
        x: u * u * p0.x + 2.0 * u * t * c.x + t * t * p1.x,
        y: u * u * p0.y + 2.0 * u * t * c.y + t * t * p1.y,
    }
}

fn distance(a: Point, b: Point) -> f64 {
    ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt()
}

pub fn parse_path(d: &str) -> Result<PathGeometry, PathError> {
    let tokens = tokenize(d)?;
    let mut iter = tokens.into_iter().peekable();

    let mut points: Vec<Point> = Vec::new();
    let mut dist: Vec<f64> = Vec::new();
    let mut cmd: Option<char> = None;

    fn coord<I: Iterator<Item = Token>>(it: &mut std::iter::Peekable<I>, cmd: char) -> Result<Point, PathError> {
        let mut xy = [0.0; 2];
        for v in xy.iter_mut() {
            match it.next() {
                Some(Token::Number(n)) => *v = n,
                _ => return Err(PathError::MissingCoordinate(cmd)),
            }
        }
        Ok(Point { x: xy[0], y: xy[1] })
    }

    fn push(points: &mut Vec<Point>, dist: &mut Vec<f64>, p: Point, jump: bool) {
        let d = match (points.last(), dist.last()) {
            (Some(&prev), Some(&acc)) if !jump => acc + distance(prev, p),
            (_, Some(&acc)) => acc,
            _ => 0.0,
        };
        points.push(p);
        dist.push(d);
    }

    loop {
        let explicit = match iter.peek() {
            Some(Token::Command(c)) => Some(*c),
            Some(Token::Number(_)) => None,
            None => break,
        };
        let c = match explicit {
            Some(c) => {
                iter.next();
                c
            }
            // Repeated coordinates continue the previous command, and a
            // repeated move-to continues as line-to.
            None => match cmd {
                Some('M') => 'L',
                Some(c) => c,
                None => return Err(PathError::NoMoveTo),
            },
        };
        if cmd.is_none() && c != 'M' {
            return Err(PathError::NoMoveTo);
        }
        match c {
            'M' => {
                let p = coord(&mut iter, c)?;
                push(&mut points, &mut dist, p, true);
            }
            'L' => {
                let p = coord(&mut iter, c)?;
                push(&mut points, &mut dist, p, false);
            }
            'Q' => {
                let ctrl = coord(&mut iter, c)?;
                let end = coord(&mut iter, c)?;
                let start = *points.last().ok_or(PathError::NoMoveTo)?;
                for i in 1..=QUAD_SAMPLES {
                    let t = i as f64 / QUAD_SAMPLES as f64;
                    push(&mut points, &mut dist, quad(start, ctrl, end, t), false);
                }
            }
            other => return Err(PathError::UnsupportedCommand(other)),
        }
        cmd = Some(c);
    }

    if points.is_empty() {
        return Err(PathError::NoMoveTo);
    }

    Ok(PathGeometry {
        source: d.to_string(),
        points,
        dist,
    })
}

impl PathGeometry {
    pub fn total_length(&self) -> f64 {
        self.dist.last().cloned().unwrap_or(0.0)
    }

    /// Point at a percentage of the path length. Out-of-range input is
    /// clamped to the ends.
    pub fn point_at(&self, percent: f64) -> Point {
        let pct = if percent.is_nan() { 0.0 } else { percent.max(0.0).min(100.0) };
        let target = pct / 100.0 * self.total_length();
        let idx = match self.dist.binary_search_by(|d| d.partial_cmp(&target).unwrap_or(std::cmp::Ordering::Less)) {
            Ok(i) => return self.points[i],
            Err(i) => i,
        };
        if idx == 0 {
            return self.points[0];
        }
        if idx >= self.points.len() {
            return self.points[self.points.len() - 1];
        }
        let (a, b) = (self.points[idx - 1], self.points[idx]);
        let span = self.dist[idx] - self.dist[idx - 1];
        if span <= 0.0 {
            return b;
        }
        let f = (target - self.dist[idx - 1]) / span;
        Point {
            x: a.x + f * (b.x - a.x),
            y: a.y + f * (b.y - a.y),
        }
    }
}
