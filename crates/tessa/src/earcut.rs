//! Ear clipping polygon triangulation with hole bridging and z-order hashing for large inputs.
//!
//! The triangulator keeps its node storage between calls; reuse one instance to avoid
//! reallocating for every polygon.

use num_traits::Float;

const NIL: usize = usize::MAX;

/// Inputs with more points than this get their ear tests accelerated by a z-order curve.
const HASH_THRESHOLD: usize = 80;

#[derive(Debug, Clone, Copy)]
struct Node<T> {
    /// Vertex index in the input.
    i: u32,
    x: T,
    y: T,
    prev: usize,
    next: usize,
    z: u32,
    prev_z: usize,
    next_z: usize,
    steiner: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    First,
    Filtered,
    Cured,
}

#[derive(Debug, Clone, Copy)]
struct Hash<T> {
    min_x: T,
    min_y: T,
    inv_size: T,
}

#[derive(Debug, Default)]
pub struct Earcut<T> {
    data: Vec<[T; 2]>,
    nodes: Vec<Node<T>>,
    queue: Vec<usize>,
}

impl<T: Float + From<u16>> Earcut<T> {
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            nodes: Vec::new(),
            queue: Vec::new(),
        }
    }

    /// Triangulates the outer ring `data[..hole_indices[0]]` minus every hole ring. Hole `k`
    /// spans from `hole_indices[k]` to the next hole start (or the end of the data).
    ///
    /// Triangles are appended to `out` as vertex indices into `data`. Nothing is appended for
    /// degenerate input.
    pub fn earcut(
        &mut self,
        data: impl IntoIterator<Item = [T; 2]>,
        hole_indices: &[usize],
        out: &mut Vec<u32>,
    ) {
        self.data.clear();
        self.data.extend(data);
        self.nodes.clear();
        self.queue.clear();

        let len = self.data.len();
        let outer_len = hole_indices.first().copied().unwrap_or(len).min(len);

        let Some(mut outer) = self.linked_list(0, outer_len, true) else {
            return;
        };
        if self.nodes[outer].next == self.nodes[outer].prev {
            return;
        }

        if !hole_indices.is_empty() {
            outer = self.eliminate_holes(hole_indices, outer);
        }

        let hash = if len > HASH_THRESHOLD {
            let mut min_x = self.data[0][0];
            let mut min_y = self.data[0][1];
            let mut max_x = min_x;
            let mut max_y = min_y;

            for [x, y] in self.data[1..outer_len].iter().copied() {
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x);
                max_y = max_y.max(y);
            }

            let size = (max_x - min_x).max(max_y - min_y);
            let inv_size = if size != T::zero() {
                <T as From<u16>>::from(32767) / size
            } else {
                T::zero()
            };

            Some(Hash {
                min_x,
                min_y,
                inv_size,
            })
            .filter(|hash| hash.inv_size != T::zero())
        } else {
            None
        };

        self.earcut_linked(Some(outer), out, hash, Pass::First);
    }

    fn linked_list(&mut self, start: usize, end: usize, clockwise: bool) -> Option<usize> {
        let mut last = None;

        if clockwise == (self.signed_area(start, end) > T::zero()) {
            for i in start..end {
                last = Some(self.insert_node(i, last));
            }
        } else {
            for i in (start..end).rev() {
                last = Some(self.insert_node(i, last));
            }
        }

        if let Some(node) = last {
            let next = self.nodes[node].next;
            if self.equals(node, next) {
                self.remove_node(node);
                last = Some(next);
            }
        }

        last
    }

    fn signed_area(&self, start: usize, end: usize) -> T {
        if start >= end {
            return T::zero();
        }

        let mut sum = T::zero();
        let mut j = end - 1;
        for i in start..end {
            let [xi, yi] = self.data[i];
            let [xj, yj] = self.data[j];
            sum = sum + (xj - xi) * (yi + yj);
            j = i;
        }
        sum
    }

    fn insert_node(&mut self, i: usize, last: Option<usize>) -> usize {
        let [x, y] = self.data[i];
        let p = self.nodes.len();

        self.nodes.push(Node {
            i: i as u32,
            x,
            y,
            prev: p,
            next: p,
            z: 0,
            prev_z: NIL,
            next_z: NIL,
            steiner: false,
        });

        if let Some(last) = last {
            let next = self.nodes[last].next;
            self.nodes[p].next = next;
            self.nodes[p].prev = last;
            self.nodes[next].prev = p;
            self.nodes[last].next = p;
        }

        p
    }

    fn remove_node(&mut self, p: usize) {
        let Node {
            prev,
            next,
            prev_z,
            next_z,
            ..
        } = self.nodes[p];

        self.nodes[next].prev = prev;
        self.nodes[prev].next = next;

        if prev_z != NIL {
            self.nodes[prev_z].next_z = next_z;
        }
        if next_z != NIL {
            self.nodes[next_z].prev_z = prev_z;
        }
    }

    /// Removes duplicate and collinear points between `start` and `end`.
    fn filter_points(&mut self, start: usize, end: Option<usize>) -> usize {
        let mut end = end.unwrap_or(start);
        let mut p = start;

        loop {
            let mut again = false;
            let node = self.nodes[p];

            if !node.steiner
                && (self.equals(p, node.next) || self.area(node.prev, p, node.next) == T::zero())
            {
                self.remove_node(p);
                p = node.prev;
                end = p;
                if p == self.nodes[p].next {
                    break;
                }
                again = true;
            } else {
                p = node.next;
            }

            if !again && p == end {
                break;
            }
        }

        end
    }

    fn earcut_linked(
        &mut self,
        ear: Option<usize>,
        out: &mut Vec<u32>,
        hash: Option<Hash<T>>,
        pass: Pass,
    ) {
        let Some(mut ear) = ear else {
            return;
        };

        if pass == Pass::First {
            if let Some(hash) = hash {
                self.index_curve(ear, hash);
            }
        }

        let mut stop = ear;

        while self.nodes[ear].prev != self.nodes[ear].next {
            let prev = self.nodes[ear].prev;
            let next = self.nodes[ear].next;

            let is_ear = match hash {
                Some(hash) => self.is_ear_hashed(ear, hash),
                None => self.is_ear(ear),
            };

            if is_ear {
                out.extend([self.nodes[prev].i, self.nodes[ear].i, self.nodes[next].i]);
                self.remove_node(ear);

                ear = self.nodes[next].next;
                stop = ear;
                continue;
            }

            ear = next;

            if ear == stop {
                match pass {
                    Pass::First => {
                        let ear = self.filter_points(ear, None);
                        self.earcut_linked(Some(ear), out, hash, Pass::Filtered);
                    }
                    Pass::Filtered => {
                        let start = self.filter_points(ear, None);
                        let ear = self.cure_local_intersections(start, out);
                        self.earcut_linked(Some(ear), out, hash, Pass::Cured);
                    }
                    Pass::Cured => self.split_earcut(ear, out, hash),
                }
                break;
            }
        }
    }

    fn is_ear(&self, ear: usize) -> bool {
        let a = self.nodes[ear].prev;
        let c = self.nodes[ear].next;

        if self.area(a, ear, c) >= T::zero() {
            return false;
        }

        let (na, nb, nc) = (&self.nodes[a], &self.nodes[ear], &self.nodes[c]);
        let x0 = na.x.min(nb.x).min(nc.x);
        let y0 = na.y.min(nb.y).min(nc.y);
        let x1 = na.x.max(nb.x).max(nc.x);
        let y1 = na.y.max(nb.y).max(nc.y);

        let mut p = nc.next;
        while p != a {
            let np = &self.nodes[p];
            if np.x >= x0
                && np.x <= x1
                && np.y >= y0
                && np.y <= y1
                && point_in_triangle(na.x, na.y, nb.x, nb.y, nc.x, nc.y, np.x, np.y)
                && self.area(np.prev, p, np.next) >= T::zero()
            {
                return false;
            }
            p = np.next;
        }

        true
    }

    fn is_ear_hashed(&self, ear: usize, hash: Hash<T>) -> bool {
        let a = self.nodes[ear].prev;
        let c = self.nodes[ear].next;

        if self.area(a, ear, c) >= T::zero() {
            return false;
        }

        let (na, nb, nc) = (&self.nodes[a], &self.nodes[ear], &self.nodes[c]);
        let x0 = na.x.min(nb.x).min(nc.x);
        let y0 = na.y.min(nb.y).min(nc.y);
        let x1 = na.x.max(nb.x).max(nc.x);
        let y1 = na.y.max(nb.y).max(nc.y);

        let min_z = z_order(x0, y0, hash);
        let max_z = z_order(x1, y1, hash);

        let blocks = |p: usize| {
            let np = &self.nodes[p];
            np.x >= x0
                && np.x <= x1
                && np.y >= y0
                && np.y <= y1
                && p != a
                && p != c
                && point_in_triangle(na.x, na.y, nb.x, nb.y, nc.x, nc.y, np.x, np.y)
                && self.area(np.prev, p, np.next) >= T::zero()
        };

        let mut p = self.nodes[ear].prev_z;
        let mut n = self.nodes[ear].next_z;

        while p != NIL && self.nodes[p].z >= min_z && n != NIL && self.nodes[n].z <= max_z {
            if blocks(p) {
                return false;
            }
            p = self.nodes[p].prev_z;

            if blocks(n) {
                return false;
            }
            n = self.nodes[n].next_z;
        }

        while p != NIL && self.nodes[p].z >= min_z {
            if blocks(p) {
                return false;
            }
            p = self.nodes[p].prev_z;
        }

        while n != NIL && self.nodes[n].z <= max_z {
            if blocks(n) {
                return false;
            }
            n = self.nodes[n].next_z;
        }

        true
    }

    /// Clips the small self intersections left after filtering.
    fn cure_local_intersections(&mut self, start: usize, out: &mut Vec<u32>) -> usize {
        let mut start = start;
        let mut p = start;

        loop {
            let a = self.nodes[p].prev;
            let p_next = self.nodes[p].next;
            let b = self.nodes[p_next].next;

            if !self.equals(a, b)
                && self.intersects(a, p, p_next, b)
                && self.locally_inside(a, b)
                && self.locally_inside(b, a)
            {
                out.extend([self.nodes[a].i, self.nodes[p].i, self.nodes[b].i]);

                self.remove_node(p);
                self.remove_node(p_next);

                p = b;
                start = b;
            }

            p = self.nodes[p].next;
            if p == start {
                break;
            }
        }

        self.filter_points(p, None)
    }

    /// Splits the polygon along a valid diagonal and triangulates both halves.
    fn split_earcut(&mut self, start: usize, out: &mut Vec<u32>, hash: Option<Hash<T>>) {
        let mut a = start;

        loop {
            let mut b = self.nodes[self.nodes[a].next].next;

            while b != self.nodes[a].prev {
                if self.nodes[a].i != self.nodes[b].i && self.is_valid_diagonal(a, b) {
                    let c = self.split_polygon(a, b);

                    let a_next = self.nodes[a].next;
                    let a = self.filter_points(a, Some(a_next));
                    let c_next = self.nodes[c].next;
                    let c = self.filter_points(c, Some(c_next));

                    self.earcut_linked(Some(a), out, hash, Pass::First);
                    self.earcut_linked(Some(c), out, hash, Pass::First);
                    return;
                }
                b = self.nodes[b].next;
            }

            a = self.nodes[a].next;
            if a == start {
                break;
            }
        }
    }

    fn eliminate_holes(&mut self, hole_indices: &[usize], mut outer: usize) -> usize {
        let len = self.data.len();
        let mut queue = std::mem::take(&mut self.queue);
        queue.clear();

        for (k, &start) in hole_indices.iter().enumerate() {
            let end = hole_indices.get(k + 1).copied().unwrap_or(len).min(len);
            let start = start.min(end);

            let Some(list) = self.linked_list(start, end, false) else {
                continue;
            };
            if list == self.nodes[list].next {
                self.nodes[list].steiner = true;
            }
            queue.push(self.leftmost(list));
        }

        queue.sort_by(|&a, &b| {
            self.nodes[a]
                .x
                .partial_cmp(&self.nodes[b].x)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        for &hole in &queue {
            outer = self.eliminate_hole(hole, outer);
        }

        self.queue = queue;
        outer
    }

    fn eliminate_hole(&mut self, hole: usize, outer: usize) -> usize {
        let Some(bridge) = self.find_hole_bridge(hole, outer) else {
            return outer;
        };

        let bridge_reverse = self.split_polygon(bridge, hole);

        let next = self.nodes[bridge_reverse].next;
        self.filter_points(bridge_reverse, Some(next));

        let next = self.nodes[bridge].next;
        self.filter_points(bridge, Some(next))
    }

    /// Finds an outer vertex the hole can be connected to without crossing any edge.
    fn find_hole_bridge(&self, hole: usize, outer: usize) -> Option<usize> {
        let hx = self.nodes[hole].x;
        let hy = self.nodes[hole].y;
        let mut qx = T::neg_infinity();
        let mut m = None;

        let mut p = outer;
        loop {
            let np = &self.nodes[p];
            let nn = &self.nodes[np.next];

            if hy <= np.y && hy >= nn.y && nn.y != np.y {
                let x = np.x + (hy - np.y) * (nn.x - np.x) / (nn.y - np.y);
                if x <= hx && x > qx {
                    qx = x;
                    m = Some(if np.x < nn.x { p } else { np.next });
                    if x == hx {
                        return m;
                    }
                }
            }

            p = np.next;
            if p == outer {
                break;
            }
        }

        let mut m = m?;

        let stop = m;
        let mx = self.nodes[m].x;
        let my = self.nodes[m].y;
        let mut tan_min = T::infinity();

        p = m;
        loop {
            let np = &self.nodes[p];

            let (ax, cx) = if hy < my { (hx, qx) } else { (qx, hx) };
            if hx >= np.x
                && np.x >= mx
                && hx != np.x
                && point_in_triangle(ax, hy, mx, my, cx, hy, np.x, np.y)
            {
                let tan = (hy - np.y).abs() / (hx - np.x);

                if self.locally_inside(p, hole)
                    && (tan < tan_min
                        || (tan == tan_min
                            && (np.x > self.nodes[m].x
                                || (np.x == self.nodes[m].x && self.sector_contains_sector(m, p)))))
                {
                    m = p;
                    tan_min = tan;
                }
            }

            p = np.next;
            if p == stop {
                break;
            }
        }

        Some(m)
    }

    fn sector_contains_sector(&self, m: usize, p: usize) -> bool {
        let nm = &self.nodes[m];
        let np = &self.nodes[p];
        self.area(nm.prev, m, np.prev) < T::zero() && self.area(np.next, m, nm.next) < T::zero()
    }

    fn leftmost(&self, start: usize) -> usize {
        let mut p = start;
        let mut leftmost = start;

        loop {
            let np = &self.nodes[p];
            let nl = &self.nodes[leftmost];
            if np.x < nl.x || (np.x == nl.x && np.y < nl.y) {
                leftmost = p;
            }
            p = np.next;
            if p == start {
                break;
            }
        }

        leftmost
    }

    fn index_curve(&mut self, start: usize, hash: Hash<T>) {
        let mut p = start;

        loop {
            let node = &mut self.nodes[p];
            if node.z == 0 {
                node.z = z_order(node.x, node.y, hash);
            }
            node.prev_z = node.prev;
            node.next_z = node.next;
            p = node.next;
            if p == start {
                break;
            }
        }

        let tail = self.nodes[p].prev_z;
        self.nodes[tail].next_z = NIL;
        self.nodes[p].prev_z = NIL;

        self.sort_linked(p);
    }

    /// Merge sorts the z list in place.
    fn sort_linked(&mut self, list: usize) {
        let mut list = list;
        let mut in_size = 1;

        loop {
            let mut p = list;
            list = NIL;
            let mut tail = NIL;
            let mut merges = 0;

            while p != NIL {
                merges += 1;

                let mut q = p;
                let mut p_size = 0;
                for _ in 0..in_size {
                    p_size += 1;
                    q = self.nodes[q].next_z;
                    if q == NIL {
                        break;
                    }
                }

                let mut q_size = in_size;

                while p_size > 0 || (q_size > 0 && q != NIL) {
                    let e;
                    if p_size != 0 && (q_size == 0 || q == NIL || self.nodes[p].z <= self.nodes[q].z)
                    {
                        e = p;
                        p = self.nodes[p].next_z;
                        p_size -= 1;
                    } else {
                        e = q;
                        q = self.nodes[q].next_z;
                        q_size -= 1;
                    }

                    if tail != NIL {
                        self.nodes[tail].next_z = e;
                    } else {
                        list = e;
                    }

                    self.nodes[e].prev_z = tail;
                    tail = e;
                }

                p = q;
            }

            if tail != NIL {
                self.nodes[tail].next_z = NIL;
            }
            in_size *= 2;

            if merges <= 1 {
                break;
            }
        }
    }

    fn is_valid_diagonal(&self, a: usize, b: usize) -> bool {
        let na = &self.nodes[a];
        let nb = &self.nodes[b];

        self.nodes[na.next].i != nb.i
            && self.nodes[na.prev].i != nb.i
            && !self.intersects_polygon(a, b)
            && ((self.locally_inside(a, b)
                && self.locally_inside(b, a)
                && self.middle_inside(a, b)
                && (self.area(na.prev, a, nb.prev) != T::zero()
                    || self.area(a, nb.prev, b) != T::zero()))
                || (self.equals(a, b)
                    && self.area(na.prev, a, na.next) > T::zero()
                    && self.area(nb.prev, b, nb.next) > T::zero()))
    }

    fn area(&self, p: usize, q: usize, r: usize) -> T {
        let (p, q, r) = (&self.nodes[p], &self.nodes[q], &self.nodes[r]);
        (q.y - p.y) * (r.x - q.x) - (q.x - p.x) * (r.y - q.y)
    }

    fn equals(&self, a: usize, b: usize) -> bool {
        let (a, b) = (&self.nodes[a], &self.nodes[b]);
        a.x == b.x && a.y == b.y
    }

    fn intersects(&self, p1: usize, q1: usize, p2: usize, q2: usize) -> bool {
        let o1 = sign(self.area(p1, q1, p2));
        let o2 = sign(self.area(p1, q1, q2));
        let o3 = sign(self.area(p2, q2, p1));
        let o4 = sign(self.area(p2, q2, q1));

        if o1 != o2 && o3 != o4 {
            return true;
        }

        (o1 == 0 && self.on_segment(p1, p2, q1))
            || (o2 == 0 && self.on_segment(p1, q2, q1))
            || (o3 == 0 && self.on_segment(p2, p1, q2))
            || (o4 == 0 && self.on_segment(p2, q1, q2))
    }

    /// Whether `q` lies on segment `pr`, given the three are collinear.
    fn on_segment(&self, p: usize, q: usize, r: usize) -> bool {
        let (p, q, r) = (&self.nodes[p], &self.nodes[q], &self.nodes[r]);
        q.x <= p.x.max(r.x) && q.x >= p.x.min(r.x) && q.y <= p.y.max(r.y) && q.y >= p.y.min(r.y)
    }

    fn intersects_polygon(&self, a: usize, b: usize) -> bool {
        let ai = self.nodes[a].i;
        let bi = self.nodes[b].i;
        let mut p = a;

        loop {
            let np = &self.nodes[p];
            let next_i = self.nodes[np.next].i;
            if np.i != ai && next_i != ai && np.i != bi && next_i != bi && self.intersects(p, np.next, a, b)
            {
                return true;
            }
            p = np.next;
            if p == a {
                break;
            }
        }

        false
    }

    fn locally_inside(&self, a: usize, b: usize) -> bool {
        let na = &self.nodes[a];
        if self.area(na.prev, a, na.next) < T::zero() {
            self.area(a, b, na.next) >= T::zero() && self.area(a, na.prev, b) >= T::zero()
        } else {
            self.area(a, b, na.prev) < T::zero() || self.area(a, na.next, b) < T::zero()
        }
    }

    fn middle_inside(&self, a: usize, b: usize) -> bool {
        let two = T::one() + T::one();
        let px = (self.nodes[a].x + self.nodes[b].x) / two;
        let py = (self.nodes[a].y + self.nodes[b].y) / two;

        let mut inside = false;
        let mut p = a;

        loop {
            let np = &self.nodes[p];
            let nn = &self.nodes[np.next];
            if (np.y > py) != (nn.y > py)
                && nn.y != np.y
                && px < (nn.x - np.x) * (py - np.y) / (nn.y - np.y) + np.x
            {
                inside = !inside;
            }
            p = np.next;
            if p == a {
                break;
            }
        }

        inside
    }

    /// Links `a` and `b` with a bridge, splitting the ring in two. Returns the copy of `b`.
    fn split_polygon(&mut self, a: usize, b: usize) -> usize {
        let a2 = self.nodes.len();
        let b2 = a2 + 1;

        let mut na = self.nodes[a];
        let mut nb = self.nodes[b];
        for node in [&mut na, &mut nb] {
            node.prev_z = NIL;
            node.next_z = NIL;
            node.z = 0;
            node.steiner = false;
        }
        self.nodes.push(na);
        self.nodes.push(nb);

        let an = self.nodes[a].next;
        let bp = self.nodes[b].prev;

        self.nodes[a].next = b;
        self.nodes[b].prev = a;

        self.nodes[a2].next = an;
        self.nodes[an].prev = a2;

        self.nodes[b2].next = a2;
        self.nodes[a2].prev = b2;

        self.nodes[bp].next = b2;
        self.nodes[b2].prev = bp;

        b2
    }
}

fn sign<T: Float>(value: T) -> i8 {
    if value > T::zero() {
        1
    } else if value < T::zero() {
        -1
    } else {
        0
    }
}

#[allow(clippy::too_many_arguments)]
fn point_in_triangle<T: Float>(ax: T, ay: T, bx: T, by: T, cx: T, cy: T, px: T, py: T) -> bool {
    (cx - px) * (ay - py) >= (ax - px) * (cy - py)
        && (ax - px) * (by - py) >= (bx - px) * (ay - py)
        && (bx - px) * (cy - py) >= (cx - px) * (by - py)
}

/// Interleaves the bits of the scaled coordinates.
fn z_order<T: Float>(x: T, y: T, hash: Hash<T>) -> u32 {
    let spread = |v: T| {
        let mut v = v.to_u32().unwrap_or(0);
        v = (v | (v << 8)) & 0x00FF00FF;
        v = (v | (v << 4)) & 0x0F0F0F0F;
        v = (v | (v << 2)) & 0x33333333;
        v = (v | (v << 1)) & 0x55555555;
        v
    };

    let x = spread((x - hash.min_x) * hash.inv_size);
    let y = spread((y - hash.min_y) * hash.inv_size);

    x | (y << 1)
}
